//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the PawHaven service:
//! - Auth endpoints (signup/login/logout/me/oauth)
//! - Pet listing endpoints
//! - Adoption application endpoints
//! - Community forum endpoints
//! - Notification endpoints
//! - Pet dictionary endpoints

pub mod adoptions;
pub mod auth;
pub mod common;
pub mod community;
pub mod dictionary;
pub mod middleware;
pub mod notifications;
pub mod pets;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Shelter routes (need auth + shelter role)
    let shelter_routes = Router::new()
        .nest("/pets", pets::shelter_router())
        .route_layer(axum_middleware::from_fn(middleware::require_shelter))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not a specific role)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/adoptions", adoptions::router())
        .nest("/community", community::protected_router())
        .nest("/notifications", notifications::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public community routes see the viewer when a session travels along,
    // so comment listings can mark the viewer's likes
    let public_community = community::public_router().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::optional_auth),
    );

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/pets", pets::public_router())
        .nest("/community", public_community)
        .nest("/dictionary", dictionary::router())
        .merge(shelter_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS must allow credentials for cookie-based auth
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
