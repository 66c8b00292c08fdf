use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the identity layer that owns sign-in and passwords.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TutorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Portal role, fixed once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Admin => "admin",
        }
    }
}

/// Lifecycle state shared by accounts and profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Pending,
    Active,
    Blocked,
}

impl AccountStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
        }
    }
}

/// School grade supported by the portal. Grades outside 4..=12 are
/// unrepresentable; raw numbers are checked at the parsing boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    Grade4,
    Grade5,
    Grade6,
    Grade7,
    Grade8,
    Grade9,
    Grade10,
    Grade11,
    Grade12,
}

impl Grade {
    pub const ALL: [Grade; 9] = [
        Grade::Grade4,
        Grade::Grade5,
        Grade::Grade6,
        Grade::Grade7,
        Grade::Grade8,
        Grade::Grade9,
        Grade::Grade10,
        Grade::Grade11,
        Grade::Grade12,
    ];

    pub fn new(number: u8) -> Option<Self> {
        match number {
            4 => Some(Grade::Grade4),
            5 => Some(Grade::Grade5),
            6 => Some(Grade::Grade6),
            7 => Some(Grade::Grade7),
            8 => Some(Grade::Grade8),
            9 => Some(Grade::Grade9),
            10 => Some(Grade::Grade10),
            11 => Some(Grade::Grade11),
            12 => Some(Grade::Grade12),
            _ => None,
        }
    }

    pub const fn number(self) -> u8 {
        match self {
            Grade::Grade4 => 4,
            Grade::Grade5 => 5,
            Grade::Grade6 => 6,
            Grade::Grade7 => 7,
            Grade::Grade8 => 8,
            Grade::Grade9 => 9,
            Grade::Grade10 => 10,
            Grade::Grade11 => 11,
            Grade::Grade12 => 12,
        }
    }

    pub const fn band(self) -> GradeBand {
        match self {
            Grade::Grade4
            | Grade::Grade5
            | Grade::Grade6
            | Grade::Grade7
            | Grade::Grade8
            | Grade::Grade9 => GradeBand::Junior,
            Grade::Grade10 | Grade::Grade11 | Grade::Grade12 => GradeBand::Senior,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grade {}", self.number())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("only grades 4 to 12 are supported (got {0})")]
pub struct GradeOutOfRange(pub u8);

impl TryFrom<u8> for Grade {
    type Error = GradeOutOfRange;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Grade::new(number).ok_or(GradeOutOfRange(number))
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.number()
    }
}

/// Grade band a tutor registers for. Juniors share one subject pool per
/// grade; seniors pick a fixed number of subjects themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeBand {
    Junior,
    Senior,
}

impl GradeBand {
    pub const fn label(self) -> &'static str {
        match self {
            GradeBand::Junior => "grades 4-9",
            GradeBand::Senior => "grades 10-12",
        }
    }

    pub fn contains(self, grade: Grade) -> bool {
        grade.band() == self
    }

    pub fn grades(self) -> impl Iterator<Item = Grade> {
        Grade::ALL
            .into_iter()
            .filter(move |grade| grade.band() == self)
    }
}

/// Registered portal user. Sign-in credentials live with the identity
/// collaborator, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an account; the gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub user_id: UserId,
    pub date_of_birth: NaiveDate,
    pub grade: Grade,
    pub enrollment_date: DateTime<Utc>,
    /// Derived from age at enrollment time; never client-supplied.
    pub can_join_subject_channels: bool,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudentProfile {
    pub user_id: UserId,
    pub date_of_birth: NaiveDate,
    pub grade: Grade,
    pub enrollment_date: DateTime<Utc>,
    pub can_join_subject_channels: bool,
    pub status: AccountStatus,
}

/// Student profile together with its subject enrollments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub profile: StudentProfile,
    pub subject_ids: BTreeSet<SubjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorProfile {
    pub id: TutorId,
    pub user_id: UserId,
    pub grade_band: GradeBand,
    pub bio: Option<String>,
    pub contact_info: Option<String>,
    pub hire_date: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
    pub status: AccountStatus,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTutorProfile {
    pub user_id: UserId,
    pub grade_band: GradeBand,
    pub bio: Option<String>,
    pub contact_info: Option<String>,
    pub hire_date: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
    pub status: AccountStatus,
    pub is_active: bool,
}

/// Tutor profile together with its subject links and approval flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorRecord {
    pub profile: TutorProfile,
    pub links: Vec<TutorSubjectLink>,
}

impl TutorRecord {
    pub fn approved_subject_ids(&self) -> BTreeSet<SubjectId> {
        self.links
            .iter()
            .filter(|link| link.approved)
            .map(|link| link.subject_id)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub grade: Grade,
}

/// Tutor-subject link. `approved` flips only through the explicit admin
/// approval operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorSubjectLink {
    pub tutor_id: TutorId,
    pub subject_id: SubjectId,
    pub approved: bool,
    pub registered_at: DateTime<Utc>,
}

/// One channel per grade, or per (grade, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChannel {
    pub id: ChannelId,
    pub grade: Grade,
    pub subject_id: Option<SubjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMembership {
    pub user_id: UserId,
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: UserId,
    pub channel_id: ChannelId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub course_id: CourseId,
}
