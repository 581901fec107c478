use axum::http::StatusCode;
use axum::response::Response;
use tokio::task;

use adminhub_auth::{PasswordError, hash_password, verify_password};
use adminhub_core::CompanyId;
use adminhub_directory::validate;
use adminhub_infra::Trashed;

use crate::app::errors;
use crate::app::services::AppServices;

/// Validate and hash a password chosen by the caller.
///
/// Argon2 runs on the blocking pool.
pub async fn hash_new_password(password: &str) -> Result<String, Response> {
    validate::password(password).map_err(|e| errors::lifecycle_error_to_response(e.into()))?;

    let password = password.to_string();
    let hashed = task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hashing(format!("hashing task failed: {e}")))
        .and_then(|result| result);

    hashed.map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "password hashing failed")
    })
}

/// Check a presented password against a stored hash on the blocking pool.
pub async fn check_password(password: String, phc: String) -> Result<(), PasswordError> {
    task::spawn_blocking(move || verify_password(&password, &phc))
        .await
        .map_err(|e| PasswordError::Hashing(format!("verification task failed: {e}")))?
}

/// Resolve a company slug to the id of a live company.
pub fn company_id_for(services: &AppServices, slug: &str) -> Result<CompanyId, Response> {
    services
        .companies
        .find(slug, Trashed::Without)
        .map(|company| company.id)
        .map_err(errors::lifecycle_error_to_response)
}
