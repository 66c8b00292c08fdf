//! Student and tutor enrollment: the grade-dependent eligibility rules and
//! the registration/approval workflow that applies them.

pub mod domain;
pub(crate) mod guard;
pub mod policy;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    NormalizedStudentEnrollment, NormalizedTutorEnrollment, StudentEnrollmentRequest,
    StudentEnrollmentView, TutorEnrollmentRequest, TutorEnrollmentView,
};
pub use guard::{EnrollmentGuard, EnrollmentViolation};
pub use policy::EnrollmentPolicy;
pub use router::{enrollment_router, CAPABILITY_HEADER};
pub use service::{EnrollmentError, EnrollmentService};
