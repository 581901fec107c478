use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;

use adminhub_directory::{NewUser, User, UserChanges, UserStatistics};
use adminhub_infra::Trashed;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/statistics", get(user_statistics))
        .route(
            "/:username",
            get(show_user).put(update_user).patch(update_user).delete(delete_user),
        )
        .route("/:username/restore", post(restore_user))
        .route("/:username/force", delete(force_delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> Response {
    let trashed = match dto::parse_trashed(query.trashed.as_deref()) {
        Ok(trashed) => trashed,
        Err(resp) => return resp,
    };
    let company_id = match query.company.as_deref() {
        Some(slug) => match services.companies.find(slug, Trashed::With) {
            Ok(company) => Some(company.id),
            Err(e) => return errors::lifecycle_error_to_response(e),
        },
        None => None,
    };

    match services.users.list(trashed) {
        Ok(users) => {
            let users = users
                .into_iter()
                .filter(|u| company_id.is_none() || u.company_id == company_id)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(dto::items(users))).into_response()
        }
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateUserRequest>,
) -> Response {
    let password_hash = match common::hash_new_password(&body.password).await {
        Ok(hash) => hash,
        Err(resp) => return resp,
    };
    let company_id = match body.company.as_deref() {
        Some(slug) => match common::company_id_for(&services, slug) {
            Ok(id) => Some(id),
            Err(resp) => return resp,
        },
        None => None,
    };

    let user = match User::create(
        NewUser {
            username: body.username,
            name: body.name,
            email: body.email,
            password_hash,
            company_id,
            is_admin: body.is_admin,
            email_verified: body.email_verified,
        },
        Utc::now(),
    ) {
        Ok(user) => user,
        Err(e) => return errors::lifecycle_error_to_response(e.into()),
    };

    match services.users.create(user) {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn user_statistics(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.users.list(Trashed::With) {
        Ok(users) => (StatusCode::OK, Json(UserStatistics::compute(&users))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// Trashed users are visible here so they can be inspected before a restore.
pub async fn show_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    match services.users.find(&username, Trashed::With) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> Response {
    let password_hash = match body.password.as_deref() {
        Some(password) => match common::hash_new_password(password).await {
            Ok(hash) => Some(hash),
            Err(resp) => return resp,
        },
        None => None,
    };
    let company_id = match body.company {
        Some(Some(slug)) => match common::company_id_for(&services, &slug) {
            Ok(id) => Some(Some(id)),
            Err(resp) => return resp,
        },
        Some(None) => Some(None),
        None => None,
    };

    let changes = UserChanges {
        username: body.username,
        name: body.name,
        email: body.email,
        password_hash,
        company_id,
        is_admin: body.is_admin,
        email_verified_at: None,
    };
    let verified = body.email_verified;

    let result = services.users.update(&username, move |user| {
        user.apply(changes)?;
        if let Some(verified) = verified {
            if verified != user.has_verified_email() {
                user.email_verified_at = verified.then(Utc::now);
            }
        }
        Ok(())
    });

    match result {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

/// Soft delete. Every access token of the user is revoked before this returns.
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    match services.users.delete(&username) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn restore_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    match services.users.restore(&username) {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn force_delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    match services.users.force_delete(&username) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
