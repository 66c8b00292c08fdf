use std::sync::Arc;

use chrono::Utc;

use super::domain::{StudentEnrollmentRequest, TutorEnrollmentRequest};
use super::guard::{EnrollmentGuard, EnrollmentViolation};
use super::policy::EnrollmentPolicy;
use crate::portal::domain::{
    AccountStatus, Grade, NewStudentProfile, NewTutorProfile, Role, StudentProfile, StudentRecord,
    SubjectId, TutorId, TutorRecord, TutorSubjectLink, UserId,
};
use crate::portal::gateway::{GatewayError, PortalGateway};

/// Service composing the enrollment guard with the persistence gateway.
///
/// Each operation is one logical transaction: the gateway commits the
/// profile and its join rows together or rejects the batch, and a
/// uniqueness race on commit surfaces as the same tagged error a prior
/// read-check would have produced.
pub struct EnrollmentService<G> {
    guard: EnrollmentGuard,
    gateway: Arc<G>,
}

impl<G> EnrollmentService<G>
where
    G: PortalGateway + 'static,
{
    pub fn new(gateway: Arc<G>, policy: EnrollmentPolicy) -> Self {
        Self {
            guard: EnrollmentGuard::with_policy(policy),
            gateway,
        }
    }

    pub fn guard(&self) -> &EnrollmentGuard {
        &self.guard
    }

    /// Create the student profile for `user_id` plus its subject joins as a
    /// single atomic unit.
    pub fn register_student(
        &self,
        user_id: &UserId,
        request: StudentEnrollmentRequest,
    ) -> Result<StudentRecord, EnrollmentError> {
        let account = self
            .gateway
            .fetch_account(user_id)?
            .ok_or(EnrollmentError::AccountNotFound)?;
        if account.role != Role::Student {
            return Err(EnrollmentError::RoleMismatch {
                role: account.role,
            });
        }
        if self.gateway.student_for_user(user_id)?.is_some() {
            return Err(EnrollmentError::ProfileAlreadyExists);
        }

        let grade = Grade::new(request.grade).ok_or(EnrollmentViolation::InvalidGrade {
            grade: request.grade,
        })?;
        let pool = self.gateway.subjects_for_grade(grade)?;
        let now = Utc::now();
        let normalized = self
            .guard
            .validate_student(&request, &pool, now.date_naive())?;

        let profile = NewStudentProfile {
            user_id: user_id.clone(),
            date_of_birth: normalized.date_of_birth,
            grade: normalized.grade,
            enrollment_date: now,
            can_join_subject_channels: normalized.can_join_subject_channels,
            status: AccountStatus::Active,
        };

        match self.gateway.insert_student(profile, &normalized.subject_ids) {
            Ok(record) => Ok(record),
            Err(GatewayError::Conflict) => Err(EnrollmentError::ProfileAlreadyExists),
            Err(other) => Err(other.into()),
        }
    }

    /// Revalidate and replace an existing student enrollment. The subject
    /// set is swapped wholesale and the channel flag recomputed.
    pub fn update_student(
        &self,
        user_id: &UserId,
        request: StudentEnrollmentRequest,
    ) -> Result<StudentRecord, EnrollmentError> {
        let record = self
            .gateway
            .student_for_user(user_id)?
            .ok_or(EnrollmentError::ProfileNotFound)?;

        let grade = Grade::new(request.grade).ok_or(EnrollmentViolation::InvalidGrade {
            grade: request.grade,
        })?;
        let pool = self.gateway.subjects_for_grade(grade)?;
        let normalized =
            self.guard
                .validate_student(&request, &pool, Utc::now().date_naive())?;

        let profile = StudentProfile {
            date_of_birth: normalized.date_of_birth,
            grade: normalized.grade,
            can_join_subject_channels: normalized.can_join_subject_channels,
            ..record.profile
        };
        self.gateway
            .update_student(profile.clone(), &normalized.subject_ids)?;

        Ok(StudentRecord {
            profile,
            subject_ids: normalized.subject_ids,
        })
    }

    /// Remove the student profile for `user_id`, cascading to join rows.
    pub fn delete_student(&self, user_id: &UserId) -> Result<(), EnrollmentError> {
        let record = self
            .gateway
            .student_for_user(user_id)?
            .ok_or(EnrollmentError::ProfileNotFound)?;
        self.gateway.delete_student(record.profile.id)?;
        Ok(())
    }

    /// Create the tutor profile for `user_id`; every subject link starts
    /// unapproved.
    pub fn register_tutor(
        &self,
        user_id: &UserId,
        request: TutorEnrollmentRequest,
    ) -> Result<TutorRecord, EnrollmentError> {
        let account = self
            .gateway
            .fetch_account(user_id)?
            .ok_or(EnrollmentError::AccountNotFound)?;
        if account.role != Role::Tutor {
            return Err(EnrollmentError::RoleMismatch {
                role: account.role,
            });
        }
        if self.gateway.tutor_for_user(user_id)?.is_some() {
            return Err(EnrollmentError::ProfileAlreadyExists);
        }

        let pool = self.gateway.subjects_for_band(request.grade_band)?;
        let normalized = self.guard.validate_tutor(&request, &pool)?;

        let now = Utc::now();
        let profile = NewTutorProfile {
            user_id: user_id.clone(),
            grade_band: normalized.grade_band,
            bio: request.bio,
            contact_info: request.contact_info,
            hire_date: now,
            registered_at: now,
            status: AccountStatus::Active,
            is_active: true,
        };

        match self.gateway.insert_tutor(profile, &normalized.subject_ids) {
            Ok(record) => Ok(record),
            Err(GatewayError::Conflict) => Err(EnrollmentError::ProfileAlreadyExists),
            Err(other) => Err(other.into()),
        }
    }

    /// Remove the tutor profile for `user_id`, cascading to its links.
    pub fn delete_tutor(&self, user_id: &UserId) -> Result<(), EnrollmentError> {
        let record = self
            .gateway
            .tutor_for_user(user_id)?
            .ok_or(EnrollmentError::ProfileNotFound)?;
        self.gateway.delete_tutor(record.profile.id)?;
        Ok(())
    }

    /// Record a tutor's request to teach a subject. Re-requesting an
    /// existing unapproved link returns it unchanged; an approved link is a
    /// conflict.
    pub fn request_subject_approval(
        &self,
        tutor_id: TutorId,
        subject_id: SubjectId,
    ) -> Result<TutorSubjectLink, EnrollmentError> {
        self.gateway
            .fetch_tutor(tutor_id)?
            .ok_or(EnrollmentError::ProfileNotFound)?;
        self.gateway
            .fetch_subject(subject_id)?
            .ok_or(EnrollmentViolation::UnknownSubject(subject_id))?;

        if let Some(link) = self.gateway.tutor_subject_link(tutor_id, subject_id)? {
            if link.approved {
                return Err(EnrollmentError::AlreadyApproved);
            }
            return Ok(link);
        }

        match self
            .gateway
            .insert_tutor_subject(tutor_id, subject_id, Utc::now())
        {
            Ok(link) => Ok(link),
            // A concurrent request won the insert; surface its row instead.
            Err(GatewayError::DuplicateLink) => {
                let link = self
                    .gateway
                    .tutor_subject_link(tutor_id, subject_id)?
                    .ok_or(EnrollmentError::LinkNotFound)?;
                if link.approved {
                    Err(EnrollmentError::AlreadyApproved)
                } else {
                    Ok(link)
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Flip a tutor-subject link to approved. Admin capability is an
    /// explicit argument; the caller's identity layer decides it.
    pub fn approve_subject(
        &self,
        caller_is_admin: bool,
        tutor_id: TutorId,
        subject_id: SubjectId,
    ) -> Result<(), EnrollmentError> {
        if !caller_is_admin {
            return Err(EnrollmentError::AdminRequired);
        }

        match self.gateway.approve_tutor_subject(tutor_id, subject_id) {
            Ok(()) => Ok(()),
            Err(GatewayError::NotFound) => Err(EnrollmentError::LinkNotFound),
            Err(other) => Err(other.into()),
        }
    }
}

/// Error raised by the enrollment workflow.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error(transparent)]
    Rule(#[from] EnrollmentViolation),
    #[error("no account exists for that user")]
    AccountNotFound,
    #[error("a {} account cannot hold this profile", .role.label())]
    RoleMismatch { role: Role },
    #[error("a profile already exists for this user")]
    ProfileAlreadyExists,
    #[error("no profile exists for this user")]
    ProfileNotFound,
    #[error("subject link is already approved")]
    AlreadyApproved,
    #[error("no subject link exists for that tutor and subject")]
    LinkNotFound,
    #[error("admin capability required")]
    AdminRequired,
    #[error("persistence failure: {0}")]
    Persistence(#[from] GatewayError),
}
