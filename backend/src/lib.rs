//! Pesticide Stock Management Platform - Backend
//!
//! Identifier code generation, validation, and scan tracking for
//! government-subsidized pesticide stock distribution.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use external::CodeRenderer;
use store::CodeStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CodeStore>,
    pub renderer: Arc<dyn CodeRenderer>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(liveness))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Pesticide Stock Management Platform API v1.0"
}

/// Bare liveness probe; the storage-aware check lives under /api/v1/health
async fn liveness() -> &'static str {
    "OK"
}
