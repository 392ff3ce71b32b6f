//! Notification API endpoints
//!
//! Inbox management for the authenticated user; the client polls these on an
//! interval.
//!
//! - GET /api/v1/notifications - list with unread count
//! - PUT /api/v1/notifications/read-all - mark all read
//! - PUT /api/v1/notifications/:id - mark one read
//! - DELETE /api/v1/notifications/:id - delete one

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::notification::NotificationServiceError;

/// Build the notification routes (all require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/read-all", put(mark_all_read))
        .route("/{id}", put(mark_read).delete(remove))
}

fn map_notification_error(e: NotificationServiceError) -> ApiError {
    match e {
        NotificationServiceError::NotFound => ApiError::not_found("Notification not found"),
        NotificationServiceError::Forbidden(msg) => ApiError::forbidden(msg),
        NotificationServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// GET /api/v1/notifications
async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let inbox = state
        .notification_service
        .inbox(user.0.id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(inbox))
}

/// PUT /api/v1/notifications/:id - mark read
async fn mark_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .notification_service
        .mark_read(user.0.id, id)
        .await
        .map_err(map_notification_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/notifications/read-all
async fn mark_all_read(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .notification_service
        .mark_all_read(user.0.id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

/// DELETE /api/v1/notifications/:id
async fn remove(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .notification_service
        .delete(user.0.id, id)
        .await
        .map_err(map_notification_error)?;

    Ok(StatusCode::NO_CONTENT)
}
