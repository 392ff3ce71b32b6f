//! Adoption application API endpoints
//!
//! - POST /api/v1/adoptions/:pet_id - express interest (authenticated, non-shelter)
//! - PUT /api/v1/adoptions/:id - change status (shelter owning the pet)
//! - GET /api/v1/adoptions/mine - the applicant's applications
//! - GET /api/v1/adoptions/received - applications across the shelter's pets

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::ApplicationStatus;
use crate::services::application::ApplicationServiceError;

/// Request body for expressing interest
#[derive(Debug, Default, Deserialize)]
pub struct ExpressInterestRequest {
    pub message: Option<String>,
}

/// Request body for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// Build the adoption routes (all require auth; role checks live in the service)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(list_mine))
        .route("/received", get(list_received))
        .route("/{id}", post(express_interest).put(update_status))
}

fn map_application_error(e: ApplicationServiceError) -> ApiError {
    match e {
        ApplicationServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ApplicationServiceError::NotFound(msg) => ApiError::not_found(msg),
        ApplicationServiceError::Forbidden(msg) => ApiError::forbidden(msg),
        ApplicationServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// POST /api/v1/adoptions/:pet_id - express interest
async fn express_interest(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(pet_id): Path<i64>,
    Json(body): Json<ExpressInterestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = body.message;

    let application = state
        .application_service
        .express_interest(&user.0, pet_id, message)
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// PUT /api/v1/adoptions/:id - change application status
async fn update_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let application = state
        .application_service
        .update_status(user.0.id, id, body.status)
        .await
        .map_err(map_application_error)?;

    Ok(Json(application))
}

/// GET /api/v1/adoptions/mine - the applicant's applications
async fn list_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let applications = state
        .application_service
        .list_mine(user.0.id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(applications))
}

/// GET /api/v1/adoptions/received - applications for the shelter's pets
async fn list_received(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    if !user.0.is_shelter() {
        return Err(ApiError::forbidden("Shelter account required"));
    }

    let applications = state
        .application_service
        .list_received(user.0.id)
        .await
        .map_err(map_application_error)?;

    Ok(Json(applications))
}
