use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use adminhub_auth::GateDenial;
use adminhub_infra::LifecycleError;

pub fn lifecycle_error_to_response(err: LifecycleError) -> axum::response::Response {
    match err {
        LifecycleError::Validation(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
        LifecycleError::NotFound(what) => json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found")),
        LifecycleError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        LifecycleError::CredentialRevocation(msg) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "credential_revocation_failed",
            msg,
        ),
        LifecycleError::Store(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
    }
}

/// Gate denials use their own body shape: `message`, plus `error` for 403s.
pub fn gate_denial_to_response(denial: GateDenial) -> axum::response::Response {
    let status = StatusCode::from_u16(denial.status_code()).unwrap_or(StatusCode::FORBIDDEN);
    let body = match denial.error_code() {
        Some(code) => json!({ "message": denial.to_string(), "error": code }),
        None => json!({ "message": denial.to_string() }),
    };
    (status, axum::Json(body)).into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
