use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::service::{AccountError, AccountRegistration, AccountService, AccountUpdate, AccountView};
use crate::portal::enrollment::router::caller_is_admin;
use crate::portal::domain::UserId;
use crate::portal::gateway::PortalGateway;

const ADMIN_LIST_LIMIT: usize = 50;

/// Router builder exposing registration and admin maintenance endpoints.
pub fn account_router<G>(service: Arc<AccountService<G>>) -> Router
where
    G: PortalGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/portal/accounts",
            post(register_handler::<G>).get(list_handler::<G>),
        )
        .route(
            "/api/v1/portal/accounts/:user_id",
            get(fetch_handler::<G>)
                .put(update_handler::<G>)
                .delete(delete_handler::<G>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<G>(
    State(service): State<Arc<AccountService<G>>>,
    axum::Json(registration): axum::Json<AccountRegistration>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.register(registration) {
        Ok(account) => {
            let view = AccountView::from(&account);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fetch_handler<G>(
    State(service): State<Arc<AccountService<G>>>,
    Path(user_id): Path<String>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.fetch(&UserId(user_id)) {
        Ok(account) => {
            let view = AccountView::from(&account);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<G>(
    State(service): State<Arc<AccountService<G>>>,
    headers: HeaderMap,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.list(caller_is_admin(&headers), ADMIN_LIST_LIMIT) {
        Ok(accounts) => {
            let views: Vec<AccountView> = accounts.iter().map(AccountView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<G>(
    State(service): State<Arc<AccountService<G>>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    axum::Json(update): axum::Json<AccountUpdate>,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.update(caller_is_admin(&headers), &UserId(user_id), update) {
        Ok(account) => {
            let view = AccountView::from(&account);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<G>(
    State(service): State<Arc<AccountService<G>>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    G: PortalGateway + 'static,
{
    match service.delete(caller_is_admin(&headers), &UserId(user_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AccountError) -> Response {
    let status = match &error {
        AccountError::MissingFields => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::EmailAlreadyRegistered => StatusCode::CONFLICT,
        AccountError::AccountNotFound => StatusCode::NOT_FOUND,
        AccountError::AdminRequired => StatusCode::FORBIDDEN,
        AccountError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
