use std::sync::Arc;

use axum::response::Response;
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;

use crate::portal::chat::router::chat_router;
use crate::portal::chat::service::ChatService;
use crate::portal::domain::{
    AccountStatus, ChatChannel, Grade, GradeBand, NewAccount, NewSubject, Role, Subject, TutorId,
    UserAccount, UserId,
};
use crate::portal::enrollment::domain::{StudentEnrollmentRequest, TutorEnrollmentRequest};
use crate::portal::enrollment::policy::EnrollmentPolicy;
use crate::portal::enrollment::service::EnrollmentService;
use crate::portal::gateway::PortalGateway;
use crate::portal::memory::InMemoryPortalGateway;

/// Fully provisioned portal: subjects, accounts, profiles, an approved
/// tutor link for `subjects[0]`, and two channels for grade 11.
pub(super) struct Scenario {
    pub gateway: Arc<InMemoryPortalGateway>,
    pub chat: ChatService<InMemoryPortalGateway>,
    pub enrollment: EnrollmentService<InMemoryPortalGateway>,
    pub subjects: Vec<Subject>,
    pub senior: UserId,
    pub minor: UserId,
    pub sophomore: UserId,
    pub tutor: UserId,
    pub tutor_id: TutorId,
    pub admin: UserId,
    pub subject_channel: ChatChannel,
    pub grade_channel: ChatChannel,
}

pub(super) fn scenario() -> Scenario {
    let gateway = Arc::new(InMemoryPortalGateway::new());
    let enrollment = EnrollmentService::new(gateway.clone(), EnrollmentPolicy::default());
    let chat = ChatService::new(gateway.clone());

    let subjects: Vec<Subject> = [
        "Mathematics",
        "Physics",
        "Chemistry",
        "Biology",
    ]
    .iter()
    .map(|name| {
        gateway
            .insert_subject(NewSubject {
                name: (*name).to_string(),
                grade: Grade::Grade11,
            })
            .expect("subject inserts")
    })
    .collect();
    let tenth: Vec<Subject> = ["Algebra", "Geometry", "Literature", "History"]
        .iter()
        .map(|name| {
            gateway
                .insert_subject(NewSubject {
                    name: (*name).to_string(),
                    grade: Grade::Grade10,
                })
                .expect("subject inserts")
        })
        .collect();

    let senior = account(&gateway, "senior@example.org", Role::Student).id;
    let minor = account(&gateway, "minor@example.org", Role::Student).id;
    let sophomore = account(&gateway, "sophomore@example.org", Role::Student).id;
    let tutor = account(&gateway, "tutor@example.org", Role::Tutor).id;
    let admin = account(&gateway, "admin@example.org", Role::Admin).id;

    enrollment
        .register_student(&senior, student_request(11, 18, &subjects))
        .expect("senior enrolls");
    enrollment
        .register_student(&minor, student_request(11, 10, &subjects))
        .expect("minor enrolls");
    enrollment
        .register_student(&sophomore, student_request(10, 18, &tenth))
        .expect("sophomore enrolls");

    let tutor_record = enrollment
        .register_tutor(
            &tutor,
            TutorEnrollmentRequest {
                grade_band: GradeBand::Senior,
                bio: None,
                contact_info: None,
                selected_subject_ids: vec![subjects[0].id, subjects[1].id],
            },
        )
        .expect("tutor enrolls");
    let tutor_id = tutor_record.profile.id;
    enrollment
        .approve_subject(true, tutor_id, subjects[0].id)
        .expect("approval applies");

    let subject_channel = chat
        .ensure_subject_channel(subjects[0].id)
        .expect("subject channel provisions");
    let grade_channel = chat
        .ensure_grade_channel(Grade::Grade11)
        .expect("grade channel provisions");

    Scenario {
        gateway,
        chat,
        enrollment,
        subjects,
        senior,
        minor,
        sophomore,
        tutor,
        tutor_id,
        admin,
        subject_channel,
        grade_channel,
    }
}

fn account(gateway: &InMemoryPortalGateway, email: &str, role: Role) -> UserAccount {
    gateway
        .insert_account(NewAccount {
            full_name: "Chat Fixture".to_string(),
            email: email.to_string(),
            phone: None,
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        })
        .expect("account inserts")
}

fn student_request(grade: u8, age: i32, subjects: &[Subject]) -> StudentEnrollmentRequest {
    let today = Utc::now().date_naive();
    let date_of_birth = today.with_year(today.year() - age).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(today.year() - age, today.month(), 28)
            .expect("fallback date is valid")
    });
    StudentEnrollmentRequest {
        grade,
        date_of_birth,
        selected_subject_ids: subjects.iter().take(4).map(|subject| subject.id).collect(),
    }
}

pub(super) fn chat_router_for(scenario: &Scenario) -> axum::Router {
    chat_router(Arc::new(ChatService::new(scenario.gateway.clone())))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
