use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;

use adminhub_directory::{Company, CompanyChanges, CompanyStatistics, NewCompany};
use adminhub_infra::Trashed;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/statistics", get(company_statistics))
        .route(
            "/:slug",
            get(show_company)
                .put(update_company)
                .patch(update_company)
                .delete(delete_company),
        )
        .route("/:slug/restore", post(restore_company))
        .route("/:slug/force", delete(force_delete_company))
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> Response {
    let trashed = match dto::parse_trashed(query.trashed.as_deref()) {
        Ok(trashed) => trashed,
        Err(resp) => return resp,
    };

    match services.companies.list(trashed) {
        Ok(companies) => (StatusCode::OK, Json(dto::items(companies))).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCompanyRequest>,
) -> Response {
    let company = match Company::create(
        NewCompany {
            name: body.name,
            slug: body.slug,
            email: body.email,
        },
        Utc::now(),
    ) {
        Ok(company) => company,
        Err(e) => return errors::lifecycle_error_to_response(e.into()),
    };

    match services.companies.create(company) {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn company_statistics(Extension(services): Extension<Arc<AppServices>>) -> Response {
    let companies = match services.companies.list(Trashed::With) {
        Ok(companies) => companies,
        Err(e) => return errors::lifecycle_error_to_response(e),
    };
    let users = match services.users.list(Trashed::With) {
        Ok(users) => users,
        Err(e) => return errors::lifecycle_error_to_response(e),
    };

    (StatusCode::OK, Json(CompanyStatistics::compute(&companies, &users))).into_response()
}

pub async fn show_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> Response {
    match services.companies.find(&slug, Trashed::With) {
        Ok(company) => (StatusCode::OK, Json(company)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
    Json(body): Json<dto::UpdateCompanyRequest>,
) -> Response {
    let changes = CompanyChanges {
        name: body.name,
        slug: body.slug,
        email: body.email,
    };

    match services.companies.update(&slug, move |company| company.apply(changes)) {
        Ok(company) => (StatusCode::OK, Json(company)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> Response {
    match services.companies.delete(&slug) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn restore_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> Response {
    match services.companies.restore(&slug) {
        Ok(company) => (StatusCode::OK, Json(company)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn force_delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> Response {
    match services.companies.force_delete(&slug) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
