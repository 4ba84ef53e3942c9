//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for lot documents
//! - Optional bearer authentication
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use oplots_core::document::ResourceUrls;
use oplots_core::storage::StorageService;
use oplots_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for multipart framing and text parts on top of the file itself.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Storage service for document binaries.
    pub storage: Arc<StorageService>,
    /// Public URLs of the documents resource.
    pub urls: ResourceUrls,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.storage.config().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([axum::http::header::LOCATION]),
        )
        .with_state(state)
}
