use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use adminhub_directory::User;
use adminhub_infra::Trashed;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: Option<String>,
    pub device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub login: String,
    pub password: String,
    pub device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password: String,
    /// Company slug.
    pub company: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `null` detaches the user from their company.
    #[serde(default, deserialize_with = "double_option")]
    pub company: Option<Option<String>>,
    pub is_admin: Option<bool>,
    pub email_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub slug: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub trashed: Option<String>,
    /// Company slug (users only).
    pub company: Option<String>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse<'a> {
    pub user: &'a User,
    pub token: String,
    pub token_type: &'static str,
}

pub fn items<T: Serialize>(items: Vec<T>) -> serde_json::Value {
    json!({ "items": items })
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_trashed(raw: Option<&str>) -> Result<Trashed, axum::response::Response> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("without") => Ok(Trashed::Without),
        Some("with") => Ok(Trashed::With),
        Some("only") => Ok(Trashed::Only),
        Some(_) => Err(errors::json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "trashed must be one of: with, only",
        )),
    }
}
