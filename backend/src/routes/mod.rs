//! Route definitions for the Pesticide Stock Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Offline validation (public - for scanner clients without connectivity)
        .route("/validate/:code", get(handlers::validate_code))
        // Protected routes - medicine masters
        .nest("/medicines", medicine_routes())
        // Protected routes - code generation and lifecycle
        .nest("/codes", code_routes())
        // Protected routes - scan processing and audit trail
        .nest("/scan", scan_routes())
        // Protected routes - reporting
        .nest("/reports", report_routes())
}

/// Medicine master routes (protected)
fn medicine_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_medicines).post(handlers::create_medicine))
        .route(
            "/:medicine_id",
            get(handlers::get_medicine).delete(handlers::delete_medicine),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Code generation and lifecycle routes (protected)
fn code_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_codes))
        .route("/generate", post(handlers::generate_codes))
        .route("/generate-bulk", post(handlers::bulk_generate_codes))
        .route("/lookup/:code", get(handlers::lookup_code))
        .route(
            "/:code_id",
            get(handlers::get_code).delete(handlers::delete_code),
        )
        .route("/:code_id/status", put(handlers::update_code_status))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Scan processing routes (protected)
fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::process_scan))
        .route("/logs", get(handlers::list_scan_logs))
        .route("/logs/export", get(handlers::export_scan_logs))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/generation", get(handlers::generation_statistics))
        .route_layer(middleware::from_fn(auth_middleware))
}
