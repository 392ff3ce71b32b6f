//! Pet dictionary API endpoints
//!
//! Public, read-only catalog surface.
//!
//! - GET /api/v1/dictionary/pets - filtered/sorted/paginated browse
//! - GET /api/v1/dictionary/pets/:id - entry detail
//! - GET /api/v1/dictionary/stats - entry counts by species

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, default_page_size};
use crate::api::middleware::{ApiError, AppState};
use crate::models::{DictionaryFilter, ListParams};

/// Query parameters for catalog browsing
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub species: Option<String>,
    pub size_class: Option<String>,
    /// Free-text match over breed and description
    pub q: Option<String>,
    /// Sort by life span instead of breed name
    #[serde(default)]
    pub by_life_span: bool,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Build the dictionary routes (all public)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pets", get(browse))
        .route("/pets/{id}", get(get_entry))
        .route("/stats", get(stats))
}

/// GET /api/v1/dictionary/pets
async fn browse(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = DictionaryFilter {
        species: query.species,
        size_class: query.size_class,
        query: query.q,
        sort_by_life_span: query.by_life_span,
    };
    let params = ListParams::new(query.page, query.page_size);

    let page = state
        .dictionary_service
        .browse(&filter, &params)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(page))
}

/// GET /api/v1/dictionary/pets/:id
async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .dictionary_service
        .get(id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Dictionary entry not found"))?;

    Ok(Json(entry))
}

/// GET /api/v1/dictionary/stats
async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let stats = state
        .dictionary_service
        .stats()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(stats))
}
