//! Community forum API endpoints
//!
//! - GET /api/v1/community/posts - public listing (category filter, pagination)
//! - POST /api/v1/community/posts - create post (session)
//! - GET /api/v1/community/posts/:id - detail, counts a view
//! - PUT/DELETE /api/v1/community/posts/:id - author only
//! - GET/POST /api/v1/community/posts/:id/comments - threaded comments
//! - PUT/DELETE /api/v1/community/comments/:id - author only
//! - POST /api/v1/community/posts/:id/like, .../comments/:id/like - toggle

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
use crate::models::ListParams;
use crate::models::{CreateCommentInput, CreatePostInput, LikeTargetType, UpdatePostInput};
use crate::services::community::CommunityServiceError;

/// Query parameters for the post listing
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Request body for editing a comment
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Build public community routes (optional auth is layered by the caller so
/// the comment listing can mark the viewer's likes)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/comments", get(list_comments))
}

/// Build session-required community routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", put(update_post).delete(delete_post))
        .route("/posts/{id}/comments", post(add_comment))
        .route("/posts/{id}/like", post(like_post))
        .route("/comments/{id}", put(update_comment).delete(delete_comment))
        .route("/comments/{id}/like", post(like_comment))
}

fn map_community_error(e: CommunityServiceError) -> ApiError {
    match e {
        CommunityServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        CommunityServiceError::NotFound(msg) => ApiError::not_found(msg),
        CommunityServiceError::Forbidden(msg) => ApiError::forbidden(msg),
        CommunityServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// GET /api/v1/community/posts
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let params = ListParams::new(query.page, query.page_size);
    let page = state
        .community_service
        .list_posts(query.category.as_deref(), &params)
        .await
        .map_err(map_community_error)?;

    Ok(Json(page))
}

/// POST /api/v1/community/posts
async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .community_service
        .create_post(user.0.id, body)
        .await
        .map_err(map_community_error)?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/community/posts/:id - counts a view
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .community_service
        .get_post(id, true)
        .await
        .map_err(map_community_error)?;

    Ok(Json(post))
}

/// PUT /api/v1/community/posts/:id - author only
async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .community_service
        .update_post(user.0.id, id, body)
        .await
        .map_err(map_community_error)?;

    Ok(Json(post))
}

/// DELETE /api/v1/community/posts/:id - author only
async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .community_service
        .delete_post(user.0.id, id)
        .await
        .map_err(map_community_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/community/posts/:id/comments - threaded listing
async fn list_comments(
    State(state): State<AppState>,
    viewer: Option<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .community_service
        .list_comments(id, viewer.map(|u| u.0.id))
        .await
        .map_err(map_community_error)?;

    Ok(Json(comments))
}

/// POST /api/v1/community/posts/:id/comments
async fn add_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<CreateCommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .community_service
        .add_comment(&user.0, id, body)
        .await
        .map_err(map_community_error)?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// PUT /api/v1/community/comments/:id - author only
async fn update_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .community_service
        .update_comment(user.0.id, id, body.content)
        .await
        .map_err(map_community_error)?;

    Ok(Json(comment))
}

/// DELETE /api/v1/community/comments/:id - author only
async fn delete_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .community_service
        .delete_comment(user.0.id, id)
        .await
        .map_err(map_community_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/community/posts/:id/like - toggle like
async fn like_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state
        .community_service
        .toggle_like(user.0.id, LikeTargetType::Post, id)
        .await
        .map_err(map_community_error)?;

    Ok(Json(like))
}

/// POST /api/v1/community/comments/:id/like - toggle like
async fn like_comment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let like = state
        .community_service
        .toggle_like(user.0.id, LikeTargetType::Comment, id)
        .await
        .map_err(map_community_error)?;

    Ok(Json(like))
}
