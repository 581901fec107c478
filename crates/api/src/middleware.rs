use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use adminhub_auth::{check, ensure_authenticated};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ResolvedPrincipal;

/// Attach the bearer token's owner (if any) to the request. Never rejects.
pub async fn resolve_principal(
    State(services): State<Arc<AppServices>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = extract_bearer(req.headers()).and_then(|token| services.resolve_principal(token));
    req.extensions_mut().insert(ResolvedPrincipal(principal));

    next.run(req).await
}

/// Full gate: authenticated, verified, not deactivated.
pub async fn ensure_user_is_active(req: Request<axum::body::Body>, next: Next) -> Response {
    let resolved = req.extensions().get::<ResolvedPrincipal>();
    match check(resolved.and_then(ResolvedPrincipal::principal)) {
        Ok(principal) => {
            tracing::debug!(user = %principal.username, path = %req.uri().path(), "gate admitted");
        }
        Err(denial) => {
            tracing::info!(path = %req.uri().path(), reason = ?denial, "gate denied");
            return errors::gate_denial_to_response(denial);
        }
    }

    next.run(req).await
}

/// Authentication only; used where unverified or deactivated users must still get through.
pub async fn require_authenticated(req: Request<axum::body::Body>, next: Next) -> Response {
    let resolved = req.extensions().get::<ResolvedPrincipal>();
    if let Err(denial) = ensure_authenticated(resolved.and_then(ResolvedPrincipal::principal)) {
        return errors::gate_denial_to_response(denial);
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}
