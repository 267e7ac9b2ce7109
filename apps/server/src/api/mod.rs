//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod middleware;
pub mod requester;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_request_body_size;
    let cors_origins = state.config.server.cors_origins.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/favicon.ico", get(favicon))
        .merge(routes::metrics::metrics_routes())
        .nest("/api/v1", routes::listing::listing_routes())
        .fallback(not_found)
        .with_state(state)
        // Applied in reverse order: the last layer is outermost.
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(middleware::compression())
        .layer(middleware::cors(&cors_origins))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "catalog-server"
    }))
}

async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found"
        })),
    )
}
