//! User accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use adminhub_auth::Principal;
use adminhub_core::{CompanyId, DomainResult, Entity, Model, TokenId, UserId};

use crate::validate;

/// A user account. Looked up externally by `username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub company_id: Option<CompanyId>,
    pub username: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for a new account. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub company_id: Option<CompanyId>,
    pub is_admin: bool,
    /// Mark the address as verified at creation (admin-created accounts).
    pub email_verified: bool,
}

/// Partial update. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub company_id: Option<Option<CompanyId>>,
    pub is_admin: Option<bool>,
    pub email_verified_at: Option<Option<DateTime<Utc>>>,
}

impl User {
    pub fn create(input: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id: UserId::new(),
            company_id: input.company_id,
            username: validate::route_key("username", &input.username)?,
            name: validate::name("name", &input.name)?,
            email: validate::email(&input.email)?,
            password_hash: input.password_hash,
            is_admin: input.is_admin,
            email_verified_at: input.email_verified.then_some(now),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Apply validated changes. A new email address must be verified again.
    pub fn apply(&mut self, changes: UserChanges) -> DomainResult<()> {
        if let Some(username) = changes.username {
            self.username = validate::route_key("username", &username)?;
        }
        if let Some(name) = changes.name {
            self.name = validate::name("name", &name)?;
        }
        if let Some(email) = changes.email {
            let email = validate::email(&email)?;
            if email != self.email {
                self.email = email;
                self.email_verified_at = None;
            }
        }
        if let Some(hash) = changes.password_hash {
            self.password_hash = hash;
        }
        if let Some(company_id) = changes.company_id {
            self.company_id = company_id;
        }
        if let Some(is_admin) = changes.is_admin {
            self.is_admin = is_admin;
        }
        if let Some(verified_at) = changes.email_verified_at {
            self.email_verified_at = verified_at;
        }
        Ok(())
    }

    pub fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }

    /// Active, verified administrators receive admin notifications.
    pub fn receives_admin_notifications(&self) -> bool {
        self.is_admin && self.has_verified_email() && self.deleted_at.is_none()
    }

    pub fn to_principal(&self, token_id: TokenId) -> Principal {
        Principal {
            user_id: self.id,
            username: self.username.clone(),
            is_admin: self.is_admin,
            email_verified_at: self.email_verified_at,
            deleted_at: self.deleted_at,
            token_id,
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Model for User {
    const NAME: &'static str = "user";

    fn route_key(&self) -> &str {
        &self.username
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn changed_fields(&self, original: &Self) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.username != original.username {
            changed.push("username");
        }
        if self.name != original.name {
            changed.push("name");
        }
        if self.email != original.email {
            changed.push("email");
        }
        if self.password_hash != original.password_hash {
            changed.push("password");
        }
        if self.company_id != original.company_id {
            changed.push("company_id");
        }
        if self.is_admin != original.is_admin {
            changed.push("is_admin");
        }
        if self.email_verified_at != original.email_verified_at {
            changed.push("email_verified_at");
        }
        changed
    }

    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }
}
