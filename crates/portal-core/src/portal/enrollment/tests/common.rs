use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::Value;

use crate::portal::domain::{
    AccountStatus, Book, BookId, ChatChannel, ChatMessage, ChannelId, Course, CourseId, Grade,
    GradeBand, NewAccount, NewStudentProfile, NewSubject, NewTutorProfile, Role, StudentId,
    StudentProfile, StudentRecord, Subject, SubjectId, TutorId, TutorRecord, TutorSubjectLink,
    UserAccount, UserId,
};
use crate::portal::enrollment::domain::{StudentEnrollmentRequest, TutorEnrollmentRequest};
use crate::portal::enrollment::policy::EnrollmentPolicy;
use crate::portal::enrollment::router::enrollment_router;
use crate::portal::enrollment::service::EnrollmentService;
use crate::portal::gateway::{GatewayError, PortalGateway};
use crate::portal::memory::InMemoryPortalGateway;

pub(super) fn build_service() -> (
    Arc<InMemoryPortalGateway>,
    EnrollmentService<InMemoryPortalGateway>,
) {
    let gateway = Arc::new(InMemoryPortalGateway::new());
    let service = EnrollmentService::new(gateway.clone(), EnrollmentPolicy::default());
    (gateway, service)
}

pub(super) fn seed_subjects(
    gateway: &InMemoryPortalGateway,
    grade: Grade,
    names: &[&str],
) -> Vec<Subject> {
    names
        .iter()
        .map(|name| {
            gateway
                .insert_subject(NewSubject {
                    name: (*name).to_string(),
                    grade,
                })
                .expect("subject inserts")
        })
        .collect()
}

pub(super) fn senior_pool(gateway: &InMemoryPortalGateway) -> Vec<Subject> {
    seed_subjects(
        gateway,
        Grade::Grade11,
        &["Mathematics", "Physics", "Chemistry", "Biology", "English"],
    )
}

pub(super) fn register_account(
    gateway: &InMemoryPortalGateway,
    email: &str,
    role: Role,
) -> UserAccount {
    gateway
        .insert_account(NewAccount {
            full_name: "Portal Fixture".to_string(),
            email: email.to_string(),
            phone: None,
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        })
        .expect("account inserts")
}

/// A birth date `years` whole years before today.
pub(super) fn years_ago(years: i32) -> NaiveDate {
    let today = Utc::now().date_naive();
    today.with_year(today.year() - years).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(today.year() - years, today.month(), 28)
            .expect("fallback date is valid")
    })
}

pub(super) fn student_request(
    grade: u8,
    date_of_birth: NaiveDate,
    selected: &[Subject],
) -> StudentEnrollmentRequest {
    StudentEnrollmentRequest {
        grade,
        date_of_birth,
        selected_subject_ids: selected.iter().map(|subject| subject.id).collect(),
    }
}

pub(super) fn tutor_request(grade_band: GradeBand, selected: &[Subject]) -> TutorEnrollmentRequest {
    TutorEnrollmentRequest {
        grade_band,
        bio: Some("Ten years of classroom teaching".to_string()),
        contact_info: Some("555-0147".to_string()),
        selected_subject_ids: selected.iter().map(|subject| subject.id).collect(),
    }
}

pub(super) fn enrollment_router_with_service(
    service: EnrollmentService<InMemoryPortalGateway>,
) -> axum::Router {
    enrollment_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn offline<T>() -> Result<T, GatewayError> {
    Err(GatewayError::Unavailable("database offline".to_string()))
}

/// Gateway double whose every operation fails, for persistence-path tests.
pub(super) struct UnavailableGateway;

impl PortalGateway for UnavailableGateway {
    fn insert_account(&self, _: NewAccount) -> Result<UserAccount, GatewayError> {
        offline()
    }
    fn fetch_account(&self, _: &UserId) -> Result<Option<UserAccount>, GatewayError> {
        offline()
    }
    fn list_accounts(&self, _: usize) -> Result<Vec<UserAccount>, GatewayError> {
        offline()
    }
    fn update_account(&self, _: UserAccount) -> Result<(), GatewayError> {
        offline()
    }
    fn delete_account(&self, _: &UserId) -> Result<(), GatewayError> {
        offline()
    }
    fn insert_subject(&self, _: NewSubject) -> Result<Subject, GatewayError> {
        offline()
    }
    fn fetch_subject(&self, _: SubjectId) -> Result<Option<Subject>, GatewayError> {
        offline()
    }
    fn subjects_for_grade(&self, _: Grade) -> Result<Vec<Subject>, GatewayError> {
        offline()
    }
    fn subjects_for_band(&self, _: GradeBand) -> Result<Vec<Subject>, GatewayError> {
        offline()
    }
    fn update_subject(&self, _: Subject) -> Result<(), GatewayError> {
        offline()
    }
    fn delete_subject(&self, _: SubjectId) -> Result<(), GatewayError> {
        offline()
    }
    fn subject_has_approved_link(&self, _: SubjectId) -> Result<bool, GatewayError> {
        offline()
    }
    fn insert_student(
        &self,
        _: NewStudentProfile,
        _: &BTreeSet<SubjectId>,
    ) -> Result<StudentRecord, GatewayError> {
        offline()
    }
    fn student_for_user(&self, _: &UserId) -> Result<Option<StudentRecord>, GatewayError> {
        offline()
    }
    fn update_student(
        &self,
        _: StudentProfile,
        _: &BTreeSet<SubjectId>,
    ) -> Result<(), GatewayError> {
        offline()
    }
    fn delete_student(&self, _: StudentId) -> Result<(), GatewayError> {
        offline()
    }
    fn insert_tutor(
        &self,
        _: NewTutorProfile,
        _: &BTreeSet<SubjectId>,
    ) -> Result<TutorRecord, GatewayError> {
        offline()
    }
    fn tutor_for_user(&self, _: &UserId) -> Result<Option<TutorRecord>, GatewayError> {
        offline()
    }
    fn fetch_tutor(&self, _: TutorId) -> Result<Option<TutorRecord>, GatewayError> {
        offline()
    }
    fn delete_tutor(&self, _: TutorId) -> Result<(), GatewayError> {
        offline()
    }
    fn tutor_subject_link(
        &self,
        _: TutorId,
        _: SubjectId,
    ) -> Result<Option<TutorSubjectLink>, GatewayError> {
        offline()
    }
    fn insert_tutor_subject(
        &self,
        _: TutorId,
        _: SubjectId,
        _: DateTime<Utc>,
    ) -> Result<TutorSubjectLink, GatewayError> {
        offline()
    }
    fn approve_tutor_subject(&self, _: TutorId, _: SubjectId) -> Result<(), GatewayError> {
        offline()
    }
    fn ensure_channel(
        &self,
        _: Grade,
        _: Option<SubjectId>,
    ) -> Result<ChatChannel, GatewayError> {
        offline()
    }
    fn fetch_channel(&self, _: ChannelId) -> Result<Option<ChatChannel>, GatewayError> {
        offline()
    }
    fn insert_membership(&self, _: &UserId, _: ChannelId) -> Result<bool, GatewayError> {
        offline()
    }
    fn is_member(&self, _: &UserId, _: ChannelId) -> Result<bool, GatewayError> {
        offline()
    }
    fn append_message(
        &self,
        _: &UserId,
        _: ChannelId,
        _: String,
        _: DateTime<Utc>,
    ) -> Result<ChatMessage, GatewayError> {
        offline()
    }
    fn messages_for_channel(
        &self,
        _: ChannelId,
        _: usize,
    ) -> Result<Vec<ChatMessage>, GatewayError> {
        offline()
    }
    fn insert_course(&self, _: String) -> Result<Course, GatewayError> {
        offline()
    }
    fn fetch_course(&self, _: CourseId) -> Result<Option<Course>, GatewayError> {
        offline()
    }
    fn list_courses(&self) -> Result<Vec<Course>, GatewayError> {
        offline()
    }
    fn delete_course(&self, _: CourseId) -> Result<(), GatewayError> {
        offline()
    }
    fn insert_book(&self, _: String, _: String, _: CourseId) -> Result<Book, GatewayError> {
        offline()
    }
    fn books_for_course(&self, _: CourseId) -> Result<Vec<Book>, GatewayError> {
        offline()
    }
    fn delete_book(&self, _: BookId) -> Result<(), GatewayError> {
        offline()
    }
}
