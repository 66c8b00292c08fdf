use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::domain::{JoinChannelRequest, MessageView, PostMessageRequest};
use super::service::{ChatError, ChatService};
use crate::portal::domain::ChannelId;
use crate::portal::gateway::PortalGateway;

/// Router builder exposing channel membership and messaging endpoints.
pub fn chat_router<G>(service: Arc<ChatService<G>>) -> Router
where
    G: PortalGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/portal/channels/:channel_id/members",
            post(join_channel_handler::<G>),
        )
        .route(
            "/api/v1/portal/channels/:channel_id/messages",
            post(post_message_handler::<G>),
        )
        .with_state(service)
}

pub(crate) async fn join_channel_handler<G>(
    State(service): State<Arc<ChatService<G>>>,
    Path(channel_id): Path<u64>,
    axum::Json(request): axum::Json<JoinChannelRequest>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.join_channel(&request.user_id, ChannelId(channel_id)) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn post_message_handler<G>(
    State(service): State<Arc<ChatService<G>>>,
    Path(channel_id): Path<u64>,
    axum::Json(request): axum::Json<PostMessageRequest>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.post_message(&request.user_id, ChannelId(channel_id), &request.text) {
        Ok(message) => {
            let view = MessageView::from(&message);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ChatError) -> Response {
    let status = match &error {
        ChatError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::NotEligible | ChatError::NotAMember => StatusCode::FORBIDDEN,
        ChatError::ChannelNotFound | ChatError::SubjectNotFound | ChatError::AccountNotFound => {
            StatusCode::NOT_FOUND
        }
        ChatError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
