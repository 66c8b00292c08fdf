use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};

use super::domain::{
    NormalizedStudentEnrollment, NormalizedTutorEnrollment, StudentEnrollmentRequest,
    TutorEnrollmentRequest,
};
use super::policy::EnrollmentPolicy;
use crate::portal::domain::{Grade, GradeBand, Subject, SubjectId};

/// Validation errors raised by the enrollment guard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentViolation {
    #[error("only grades 4 to 12 are supported (got {grade})")]
    InvalidGrade { grade: u8 },
    #[error("expected {expected} distinct subjects, got {actual}")]
    SubjectCountMismatch { expected: usize, actual: usize },
    #[error("subject {0:?} is not offered for this grade")]
    UnknownSubject(SubjectId),
    #[error("at least one subject must be selected")]
    NoSubjectsSelected,
}

/// Guard responsible for turning raw enrollment requests into normalized
/// enrollments. Pure validation: callers apply the result transactionally.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentGuard {
    policy: EnrollmentPolicy,
}

impl EnrollmentGuard {
    pub fn with_policy(policy: EnrollmentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EnrollmentPolicy {
        &self.policy
    }

    /// Validate a student enrollment against the subject pool for the
    /// requested grade.
    ///
    /// Grades 10-12 must name exactly the configured number of distinct,
    /// known subjects. Grades 4-9 receive the full pool for their grade; the
    /// client selection is ignored there rather than rejected. The channel
    /// flag derives from the student's age on `today`.
    pub fn validate_student(
        &self,
        request: &StudentEnrollmentRequest,
        available_subjects: &[Subject],
        today: NaiveDate,
    ) -> Result<NormalizedStudentEnrollment, EnrollmentViolation> {
        let grade = Grade::new(request.grade).ok_or(EnrollmentViolation::InvalidGrade {
            grade: request.grade,
        })?;

        let pool: BTreeSet<SubjectId> = available_subjects
            .iter()
            .filter(|subject| subject.grade == grade)
            .map(|subject| subject.id)
            .collect();

        let subject_ids = match grade.band() {
            GradeBand::Senior => {
                let selected: BTreeSet<SubjectId> =
                    request.selected_subject_ids.iter().copied().collect();
                let expected = self.policy.senior_subject_count();
                if selected.len() != expected {
                    return Err(EnrollmentViolation::SubjectCountMismatch {
                        expected,
                        actual: selected.len(),
                    });
                }
                if let Some(unknown) = selected.iter().find(|id| !pool.contains(id)) {
                    return Err(EnrollmentViolation::UnknownSubject(*unknown));
                }
                selected
            }
            GradeBand::Junior => pool,
        };

        let age = age_on(request.date_of_birth, today);
        let can_join_subject_channels = age >= self.policy.channel_min_age() as i32;

        Ok(NormalizedStudentEnrollment {
            grade,
            date_of_birth: request.date_of_birth,
            subject_ids,
            can_join_subject_channels,
        })
    }

    /// Validate a tutor enrollment against the subject pool for the
    /// requested grade band.
    pub fn validate_tutor(
        &self,
        request: &TutorEnrollmentRequest,
        available_subjects: &[Subject],
    ) -> Result<NormalizedTutorEnrollment, EnrollmentViolation> {
        if request.selected_subject_ids.is_empty() {
            return Err(EnrollmentViolation::NoSubjectsSelected);
        }

        let selected: BTreeSet<SubjectId> =
            request.selected_subject_ids.iter().copied().collect();
        let cap = self.policy.max_tutor_subjects();
        if selected.len() > cap {
            return Err(EnrollmentViolation::SubjectCountMismatch {
                expected: cap,
                actual: selected.len(),
            });
        }

        let pool: BTreeSet<SubjectId> = available_subjects
            .iter()
            .filter(|subject| request.grade_band.contains(subject.grade))
            .map(|subject| subject.id)
            .collect();
        if let Some(unknown) = selected.iter().find(|id| !pool.contains(id)) {
            return Err(EnrollmentViolation::UnknownSubject(*unknown));
        }

        Ok(NormalizedTutorEnrollment {
            grade_band: request.grade_band,
            subject_ids: selected,
        })
    }
}

/// Whole years between `date_of_birth` and `today`, counting a year only
/// once the birthday has been reached.
pub(crate) fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}
