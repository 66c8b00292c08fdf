use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::portal::domain::{
    Grade, GradeBand, StudentId, StudentRecord, SubjectId, TutorId, TutorRecord,
};

/// Inbound student enrollment payload. The grade arrives as a raw number so
/// the rule engine owns the range check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentEnrollmentRequest {
    pub grade: u8,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub selected_subject_ids: Vec<SubjectId>,
}

/// Inbound tutor enrollment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorEnrollmentRequest {
    pub grade_band: GradeBand,
    pub bio: Option<String>,
    pub contact_info: Option<String>,
    #[serde(default)]
    pub selected_subject_ids: Vec<SubjectId>,
}

/// Validated student enrollment: the subject set the portal will actually
/// store plus the derived channel flag. Produced whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedStudentEnrollment {
    pub grade: Grade,
    pub date_of_birth: NaiveDate,
    pub subject_ids: BTreeSet<SubjectId>,
    pub can_join_subject_channels: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTutorEnrollment {
    pub grade_band: GradeBand,
    pub subject_ids: BTreeSet<SubjectId>,
}

/// Sanitized representation of a stored student enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct StudentEnrollmentView {
    pub student_id: StudentId,
    pub grade: u8,
    pub subject_ids: Vec<SubjectId>,
    pub can_join_subject_channels: bool,
    pub status: &'static str,
}

impl From<&StudentRecord> for StudentEnrollmentView {
    fn from(record: &StudentRecord) -> Self {
        Self {
            student_id: record.profile.id,
            grade: record.profile.grade.number(),
            subject_ids: record.subject_ids.iter().copied().collect(),
            can_join_subject_channels: record.profile.can_join_subject_channels,
            status: record.profile.status.label(),
        }
    }
}

/// Sanitized representation of a stored tutor enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct TutorEnrollmentView {
    pub tutor_id: TutorId,
    pub grade_band: &'static str,
    pub subject_ids: Vec<SubjectId>,
    pub approved_subject_ids: Vec<SubjectId>,
    pub status: &'static str,
    pub is_active: bool,
}

impl From<&TutorRecord> for TutorEnrollmentView {
    fn from(record: &TutorRecord) -> Self {
        Self {
            tutor_id: record.profile.id,
            grade_band: record.profile.grade_band.label(),
            subject_ids: record.links.iter().map(|link| link.subject_id).collect(),
            approved_subject_ids: record.approved_subject_ids().into_iter().collect(),
            status: record.profile.status.label(),
            is_active: record.profile.is_active,
        }
    }
}
