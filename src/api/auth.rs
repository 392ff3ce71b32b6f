//! Authentication API endpoints
//!
//! - POST /api/v1/auth/signup - create account, open session
//! - POST /api/v1/auth/login - issue session
//! - POST /api/v1/auth/logout - clear session (public)
//! - GET /api/v1/auth/me - current identity
//! - POST /api/v1/auth/oauth - external-identity login

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{session_token, ApiError, AppState, AuthenticatedUser};
use crate::services::user::{LoginInput, OauthInput, SignupInput, UserServiceError};

/// Request body for signup
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_shelter: bool,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for external-identity login
#[derive(Debug, Deserialize)]
pub struct OauthRequest {
    pub email: String,
    #[serde(default)]
    pub username: String,
    pub provider: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Response for user info
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_shelter: bool,
    pub provider: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub created_at: String,
}

impl From<crate::models::User> for UserResponse {
    fn from(user: crate::models::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_shelter: user.role == crate::models::UserRole::Shelter,
            provider: user.provider,
            phone: user.phone,
            city: user.city,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/oauth", post(oauth))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/me", get(get_current_user))
}

fn map_user_error(e: UserServiceError) -> ApiError {
    match e {
        UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        UserServiceError::UserExists(msg) => ApiError::conflict(msg),
        UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
        UserServiceError::InternalError(e) => ApiError::internal_error(e.to_string()),
    }
}

/// Build the Set-Cookie value for a fresh session
fn session_cookie(token: &str, max_age_days: i64) -> String {
    format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token,
        max_age_days * 24 * 60 * 60
    )
}

/// POST /api/v1/auth/signup - create account
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = SignupInput::new(body.username, body.email, body.password, body.is_shelter);

    let (user, session) = state
        .user_service
        .signup(input)
        .await
        .map_err(map_user_error)?;

    let cookie = session_cookie(&session.id, state.user_service.session_expiration_days());
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(e.to_string()))?,
    );

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/login - issue session
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = LoginInput::new(body.email, body.password);

    let (user, session) = state
        .user_service
        .login(input)
        .await
        .map_err(map_user_error)?;

    let cookie = session_cookie(&session.id, state.user_service.session_expiration_days());
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(e.to_string()))?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/oauth - external-identity login (create-or-fetch)
async fn oauth(
    State(state): State<AppState>,
    Json(body): Json<OauthRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .user_service
        .oauth_login(OauthInput {
            email: body.email,
            username: body.username,
            provider: body.provider,
        })
        .await
        .map_err(map_user_error)?;

    let cookie = session_cookie(&session.id, state.user_service.session_expiration_days());
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(e.to_string()))?,
    );

    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// POST /api/v1/auth/logout - clear session
///
/// Public: clears the cookie unconditionally and deletes the session row
/// when one travels with the request.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = session_token(&headers) {
        state
            .user_service
            .logout(&token)
            .await
            .map_err(map_user_error)?;
    }

    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - current identity
async fn get_current_user(user: AuthenticatedUser) -> Json<UserResponse> {
    Json(user.0.into())
}
