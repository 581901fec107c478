//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, lifecycles and listener wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and query parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use adminhub_infra::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: AppConfig) -> Router {
    build_app_with_services(Arc::new(services::build_services(config)))
}

/// Build the router around existing services, so callers can inspect state.
pub fn build_app_with_services(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/v1", routes::router(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
