use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Extension, Router,
};

use crate::app::services::AppServices;
use crate::middleware;

pub mod auth;
pub mod common;
pub mod companies;
pub mod system;
pub mod users;

/// Everything under `/api/v1`.
///
/// Credential resolution runs for every request; which gate applies depends on
/// the route group.
pub fn router(services: Arc<AppServices>) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/email/verify/:id/:signature", get(auth::verify_email));

    let authenticated = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route_layer(from_fn(middleware::require_authenticated));

    let gated = Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/users", users::router())
        .nest("/companies", companies::router())
        .route_layer(from_fn(middleware::ensure_user_is_active));

    public
        .merge(authenticated)
        .merge(gated)
        .layer(from_fn_with_state(services.clone(), middleware::resolve_principal))
        .layer(Extension(services))
}
