use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use adminhub_auth::{PasswordError, TokenStore, verify_signature};
use adminhub_core::UserId;
use adminhub_directory::{NewUser, User};
use adminhub_infra::Trashed;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ResolvedPrincipal;

const DEFAULT_TOKEN_NAME: &str = "api";

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> Response {
    if body
        .password_confirmation
        .as_deref()
        .is_some_and(|confirmation| confirmation != body.password)
    {
        return errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "password confirmation does not match",
        );
    }

    let password_hash = match common::hash_new_password(&body.password).await {
        Ok(hash) => hash,
        Err(resp) => return resp,
    };

    let user = match User::create(
        NewUser {
            username: body.username,
            name: body.name,
            email: body.email,
            password_hash,
            company_id: None,
            is_admin: false,
            email_verified: false,
        },
        Utc::now(),
    ) {
        Ok(user) => user,
        Err(e) => return errors::lifecycle_error_to_response(e.into()),
    };

    let user = match services.users.create(user) {
        Ok(user) => user,
        Err(e) => return errors::lifecycle_error_to_response(e),
    };

    issue_token_response(&services, &user, body.device_name.as_deref(), StatusCode::CREATED)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Response {
    let Some(user) = find_login_user(&services, &body.login) else {
        return invalid_credentials();
    };

    match common::check_password(body.password, user.password_hash.clone()).await {
        Ok(()) => {}
        Err(PasswordError::Mismatch) => return invalid_credentials(),
        Err(e) => {
            tracing::error!(user = %user.username, error = %e, "stored password hash unusable");
            return invalid_credentials();
        }
    }

    issue_token_response(&services, &user, body.device_name.as_deref(), StatusCode::OK)
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(resolved): Extension<ResolvedPrincipal>,
) -> Response {
    let Some(principal) = resolved.principal() else {
        return errors::gate_denial_to_response(adminhub_auth::GateDenial::Unauthenticated);
    };

    match services.tokens.revoke(principal.token_id) {
        Ok(_) => {
            tracing::info!(user = %principal.username, token_id = %principal.token_id, "logged out");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    }
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(resolved): Extension<ResolvedPrincipal>,
) -> Response {
    let Some(principal) = resolved.principal() else {
        return errors::gate_denial_to_response(adminhub_auth::GateDenial::Unauthenticated);
    };

    match services.users.store().get(&principal.user_id) {
        Ok(Some(user)) => (StatusCode::OK, Json(user)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => errors::lifecycle_error_to_response(e.into()),
    }
}

pub async fn verify_email(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, signature)): Path<(String, String)>,
) -> Response {
    let Ok(user_id) = id.parse::<UserId>() else {
        return invalid_signature();
    };

    let user = match services.users.store().get(&user_id) {
        Ok(Some(user)) if user.deleted_at.is_none() => user,
        Ok(_) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return errors::lifecycle_error_to_response(e.into()),
    };

    if !verify_signature(&services.config.app_key, user.id, &user.email, &signature) {
        return invalid_signature();
    }

    if user.has_verified_email() {
        return (
            StatusCode::OK,
            Json(json!({ "message": "Email address already verified.", "user": user })),
        )
            .into_response();
    }

    match services.users.update_by_id(&user.id, |u| {
        u.email_verified_at = Some(Utc::now());
        Ok(())
    }) {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({ "message": "Email address verified.", "user": user })),
        )
            .into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// Only live accounts can sign in; a soft-deleted one looks like an unknown login.
fn find_login_user(services: &AppServices, login: &str) -> Option<User> {
    let login = login.trim().to_lowercase();
    let store = services.users.store();
    let found = if login.contains('@') {
        store.find_by_unique("email", &login, Trashed::Without)
    } else {
        store.find_by_key(&login, Trashed::Without)
    };

    match found {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "user lookup failed");
            None
        }
    }
}

fn issue_token_response(
    services: &AppServices,
    user: &User,
    device_name: Option<&str>,
    status: StatusCode,
) -> Response {
    let issued = match services.issue_token(user, device_name.unwrap_or(DEFAULT_TOKEN_NAME)) {
        Ok(issued) => issued,
        Err(e) => return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string()),
    };

    (
        status,
        Json(dto::AuthResponse {
            user,
            token: issued.plain_text,
            token_type: "Bearer",
        }),
    )
        .into_response()
}

fn invalid_credentials() -> Response {
    errors::json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "These credentials do not match our records.",
    )
}

fn invalid_signature() -> Response {
    errors::json_error(StatusCode::FORBIDDEN, "invalid_signature", "Invalid verification link.")
}
