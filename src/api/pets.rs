//! Pet listing API endpoints
//!
//! - GET /api/v1/pets - public filtered/sorted listing
//! - GET /api/v1/pets/:id - public detail
//! - POST /api/v1/pets/add - create listing (shelter)
//! - PUT /api/v1/pets/:id - update listing (shelter + owner)
//! - PUT /api/v1/pets/:id/adopt - mark adopted (shelter + owner)
//! - DELETE /api/v1/pets/:id - remove listing (shelter + owner)
//! - GET /api/v1/pets/mine - the shelter's own listings

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreatePetInput, ListParams, ListingType, PetFilter, PetGender, PetSize, PetSortKey,
    SortDirection, UpdatePetInput,
};
use crate::services::pet::PetServiceError;

/// Query parameters for the public listing
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub species: Option<String>,
    pub gender: Option<PetGender>,
    pub size: Option<PetSize>,
    pub listing_type: Option<ListingType>,
    /// Free-text match over name, breed and description
    pub q: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    #[serde(default)]
    pub include_adopted: bool,
    #[serde(default)]
    pub sort: PetSortKey,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl BrowseQuery {
    fn filter(&self) -> PetFilter {
        PetFilter {
            species: self.species.clone(),
            gender: self.gender,
            size: self.size,
            listing_type: self.listing_type,
            query: self.q.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
            include_adopted: self.include_adopted,
            sort: self.sort,
            direction: self.direction,
        }
    }
}

/// Build public pet routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pets))
        .route("/{id}", get(get_pet))
}

/// Build shelter-only pet routes (auth + role middleware applied by caller)
pub fn shelter_router() -> Router<AppState> {
    Router::new()
        .route("/add", post(create_pet))
        .route("/mine", get(list_mine))
        .route("/{id}", put(update_pet).delete(delete_pet))
        .route("/{id}/adopt", put(mark_adopted))
}

fn map_pet_error(e: PetServiceError) -> ApiError {
    match e {
        PetServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PetServiceError::NotFound => ApiError::not_found("Pet not found"),
        PetServiceError::Forbidden(msg) => ApiError::forbidden(msg),
        PetServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// GET /api/v1/pets - public filtered/sorted listing
async fn list_pets(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let page = state
        .pet_service
        .browse(&query.filter(), &params)
        .await
        .map_err(map_pet_error)?;

    Ok(Json(page))
}

/// GET /api/v1/pets/:id - public detail
async fn get_pet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pet = state.pet_service.get(id).await.map_err(map_pet_error)?;
    Ok(Json(pet))
}

/// POST /api/v1/pets/add - create listing
async fn create_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePetInput>,
) -> Result<impl IntoResponse, ApiError> {
    let pet = state
        .pet_service
        .create_listing(user.0.id, body)
        .await
        .map_err(map_pet_error)?;

    Ok((StatusCode::CREATED, Json(pet)))
}

/// PUT /api/v1/pets/:id - update listing
async fn update_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePetInput>,
) -> Result<impl IntoResponse, ApiError> {
    let pet = state
        .pet_service
        .update_listing(user.0.id, id, body)
        .await
        .map_err(map_pet_error)?;

    Ok(Json(pet))
}

/// PUT /api/v1/pets/:id/adopt - mark adopted
async fn mark_adopted(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pet = state
        .pet_service
        .mark_adopted(user.0.id, id)
        .await
        .map_err(map_pet_error)?;

    Ok(Json(pet))
}

/// DELETE /api/v1/pets/:id - remove listing
async fn delete_pet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .pet_service
        .delete_listing(user.0.id, id)
        .await
        .map_err(map_pet_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/pets/mine - the shelter's own listings
async fn list_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let pets = state
        .pet_service
        .list_mine(user.0.id)
        .await
        .map_err(map_pet_error)?;

    Ok(Json(pets))
}
