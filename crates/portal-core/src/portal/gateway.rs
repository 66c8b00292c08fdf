use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::domain::{
    Book, BookId, ChatChannel, ChatMessage, ChannelId, Course, CourseId, Grade, GradeBand,
    NewAccount, NewStudentProfile, NewSubject, NewTutorProfile, StudentId, StudentProfile,
    StudentRecord, Subject, SubjectId, TutorId, TutorRecord, TutorSubjectLink, UserAccount, UserId,
};

/// Storage abstraction the workflow services commit through.
///
/// Every method that writes more than one row is a single transaction: the
/// rows land together or not at all. Uniqueness races surface as `Conflict`
/// (one row per key) or `DuplicateLink` (join rows), never as a partial
/// write. Deleting an owner cascades to its dependent rows. Retries and
/// timeouts are the implementation's concern; callers never retry.
pub trait PortalGateway: Send + Sync {
    // accounts
    fn insert_account(&self, account: NewAccount) -> Result<UserAccount, GatewayError>;
    fn fetch_account(&self, id: &UserId) -> Result<Option<UserAccount>, GatewayError>;
    fn list_accounts(&self, limit: usize) -> Result<Vec<UserAccount>, GatewayError>;
    fn update_account(&self, account: UserAccount) -> Result<(), GatewayError>;
    /// Cascades to profiles, subject joins, memberships, and messages.
    fn delete_account(&self, id: &UserId) -> Result<(), GatewayError>;

    // subjects
    fn insert_subject(&self, subject: NewSubject) -> Result<Subject, GatewayError>;
    fn fetch_subject(&self, id: SubjectId) -> Result<Option<Subject>, GatewayError>;
    fn subjects_for_grade(&self, grade: Grade) -> Result<Vec<Subject>, GatewayError>;
    fn subjects_for_band(&self, band: GradeBand) -> Result<Vec<Subject>, GatewayError>;
    fn update_subject(&self, subject: Subject) -> Result<(), GatewayError>;
    fn delete_subject(&self, id: SubjectId) -> Result<(), GatewayError>;
    fn subject_has_approved_link(&self, id: SubjectId) -> Result<bool, GatewayError>;

    // student profiles
    /// Profile plus its subject joins, committed as one unit.
    fn insert_student(
        &self,
        profile: NewStudentProfile,
        subject_ids: &BTreeSet<SubjectId>,
    ) -> Result<StudentRecord, GatewayError>;
    fn student_for_user(&self, user_id: &UserId) -> Result<Option<StudentRecord>, GatewayError>;
    /// Replaces the profile and its entire subject set atomically.
    fn update_student(
        &self,
        profile: StudentProfile,
        subject_ids: &BTreeSet<SubjectId>,
    ) -> Result<(), GatewayError>;
    fn delete_student(&self, id: StudentId) -> Result<(), GatewayError>;

    // tutor profiles
    /// Profile plus unapproved subject links, committed as one unit.
    fn insert_tutor(
        &self,
        profile: NewTutorProfile,
        subject_ids: &BTreeSet<SubjectId>,
    ) -> Result<TutorRecord, GatewayError>;
    fn tutor_for_user(&self, user_id: &UserId) -> Result<Option<TutorRecord>, GatewayError>;
    fn fetch_tutor(&self, id: TutorId) -> Result<Option<TutorRecord>, GatewayError>;
    fn delete_tutor(&self, id: TutorId) -> Result<(), GatewayError>;

    // tutor-subject links
    fn tutor_subject_link(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
    ) -> Result<Option<TutorSubjectLink>, GatewayError>;
    fn insert_tutor_subject(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
        registered_at: DateTime<Utc>,
    ) -> Result<TutorSubjectLink, GatewayError>;
    fn approve_tutor_subject(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
    ) -> Result<(), GatewayError>;

    // chat
    /// Returns the existing channel for the (grade, subject) pair or creates
    /// it; at most one channel per pair ever exists.
    fn ensure_channel(
        &self,
        grade: Grade,
        subject_id: Option<SubjectId>,
    ) -> Result<ChatChannel, GatewayError>;
    fn fetch_channel(&self, id: ChannelId) -> Result<Option<ChatChannel>, GatewayError>;
    /// Returns `false` when the membership row already existed.
    fn insert_membership(&self, user_id: &UserId, channel_id: ChannelId)
        -> Result<bool, GatewayError>;
    fn is_member(&self, user_id: &UserId, channel_id: ChannelId) -> Result<bool, GatewayError>;
    fn append_message(
        &self,
        sender: &UserId,
        channel_id: ChannelId,
        text: String,
        sent_at: DateTime<Utc>,
    ) -> Result<ChatMessage, GatewayError>;
    fn messages_for_channel(
        &self,
        channel_id: ChannelId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, GatewayError>;

    // catalog
    fn insert_course(&self, title: String) -> Result<Course, GatewayError>;
    fn fetch_course(&self, id: CourseId) -> Result<Option<Course>, GatewayError>;
    fn list_courses(&self) -> Result<Vec<Course>, GatewayError>;
    /// Cascades to the course's books.
    fn delete_course(&self, id: CourseId) -> Result<(), GatewayError>;
    fn insert_book(
        &self,
        title: String,
        author: String,
        course_id: CourseId,
    ) -> Result<Book, GatewayError>;
    fn books_for_course(&self, course_id: CourseId) -> Result<Vec<Book>, GatewayError>;
    fn delete_book(&self, id: BookId) -> Result<(), GatewayError>;
}

/// Error enumeration for gateway failures.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("record already exists")]
    Conflict,
    #[error("join row already exists")]
    DuplicateLink,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
