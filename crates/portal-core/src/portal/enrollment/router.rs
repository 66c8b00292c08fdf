use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::domain::{
    StudentEnrollmentRequest, StudentEnrollmentView, TutorEnrollmentRequest, TutorEnrollmentView,
};
use super::service::{EnrollmentError, EnrollmentService};
use crate::portal::domain::{SubjectId, TutorId, UserId};
use crate::portal::gateway::PortalGateway;

/// Capability header the identity middleware would normally stamp on the
/// request. Standing in for it keeps the workflow's capability argument
/// explicit end to end.
pub const CAPABILITY_HEADER: &str = "x-portal-capability";

/// Router builder exposing enrollment and approval endpoints.
pub fn enrollment_router<G>(service: Arc<EnrollmentService<G>>) -> Router
where
    G: PortalGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/portal/students/:user_id",
            post(enroll_student_handler::<G>),
        )
        .route(
            "/api/v1/portal/tutors/:user_id",
            post(enroll_tutor_handler::<G>),
        )
        .route(
            "/api/v1/portal/tutors/:tutor_id/subjects/:subject_id/requests",
            post(request_approval_handler::<G>),
        )
        .route(
            "/api/v1/portal/tutors/:tutor_id/subjects/:subject_id/approval",
            post(approve_subject_handler::<G>),
        )
        .with_state(service)
}

pub(crate) fn caller_is_admin(headers: &HeaderMap) -> bool {
    headers
        .get(CAPABILITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.eq_ignore_ascii_case("admin"))
        .unwrap_or(false)
}

pub(crate) async fn enroll_student_handler<G>(
    State(service): State<Arc<EnrollmentService<G>>>,
    Path(user_id): Path<String>,
    axum::Json(request): axum::Json<StudentEnrollmentRequest>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.register_student(&UserId(user_id), request) {
        Ok(record) => {
            let view = StudentEnrollmentView::from(&record);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn enroll_tutor_handler<G>(
    State(service): State<Arc<EnrollmentService<G>>>,
    Path(user_id): Path<String>,
    axum::Json(request): axum::Json<TutorEnrollmentRequest>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.register_tutor(&UserId(user_id), request) {
        Ok(record) => {
            let view = TutorEnrollmentView::from(&record);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn request_approval_handler<G>(
    State(service): State<Arc<EnrollmentService<G>>>,
    Path((tutor_id, subject_id)): Path<(u64, u32)>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.request_subject_approval(TutorId(tutor_id), SubjectId(subject_id)) {
        Ok(link) => (StatusCode::ACCEPTED, axum::Json(link)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_subject_handler<G>(
    State(service): State<Arc<EnrollmentService<G>>>,
    Path((tutor_id, subject_id)): Path<(u64, u32)>,
    headers: HeaderMap,
) -> Response
where
    G: PortalGateway + 'static,
{
    let admin = caller_is_admin(&headers);
    match service.approve_subject(admin, TutorId(tutor_id), SubjectId(subject_id)) {
        Ok(()) => {
            let payload = json!({ "approved": true });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: EnrollmentError) -> Response {
    let status = match &error {
        EnrollmentError::Rule(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EnrollmentError::ProfileAlreadyExists | EnrollmentError::AlreadyApproved => {
            StatusCode::CONFLICT
        }
        EnrollmentError::AccountNotFound
        | EnrollmentError::ProfileNotFound
        | EnrollmentError::LinkNotFound => StatusCode::NOT_FOUND,
        EnrollmentError::RoleMismatch { .. } | EnrollmentError::AdminRequired => {
            StatusCode::FORBIDDEN
        }
        EnrollmentError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
