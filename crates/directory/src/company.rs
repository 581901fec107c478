//! Companies (tenants). Looked up externally by `slug`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use adminhub_core::{CompanyId, DomainError, DomainResult, Entity, Model};

use crate::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub slug: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub email: Option<Option<String>>,
}

impl Company {
    pub fn create(input: NewCompany, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = validate::name("name", &input.name)?;
        let slug = match input.slug {
            Some(slug) => validate::route_key("slug", &slug)?,
            None => derive_slug(&name)?,
        };

        Ok(Self {
            id: CompanyId::new(),
            name,
            slug,
            email: input.email.as_deref().map(validate::email).transpose()?,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    pub fn apply(&mut self, changes: CompanyChanges) -> DomainResult<()> {
        if let Some(name) = changes.name {
            self.name = validate::name("name", &name)?;
        }
        if let Some(slug) = changes.slug {
            self.slug = validate::route_key("slug", &slug)?;
        }
        if let Some(email) = changes.email {
            self.email = email.as_deref().map(validate::email).transpose()?;
        }
        Ok(())
    }
}

fn derive_slug(name: &str) -> DomainResult<String> {
    let slug = validate::slugify(name);
    if slug.len() < 3 {
        return Err(DomainError::validation(
            "slug cannot be derived from name; provide one explicitly",
        ));
    }
    validate::route_key("slug", &slug)
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Model for Company {
    const NAME: &'static str = "company";

    fn route_key(&self) -> &str {
        &self.slug
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
        if self.name != original.name {
            changed.push("name");
        }
        if self.slug != original.slug {
            changed.push("slug");
        }
        if self.email != original.email {
            changed.push("email");
        }
        changed
    }
}
