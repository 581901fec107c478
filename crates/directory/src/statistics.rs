//! Aggregate counts served by the `statistics` endpoints.

use serde::Serialize;

use crate::{Company, User};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStatistics {
    pub total: usize,
    pub active: usize,
    pub deactivated: usize,
    pub verified: usize,
    pub unverified: usize,
    pub admins: usize,
}

impl UserStatistics {
    /// Counts over every user, trashed ones included.
    pub fn compute<'a>(users: impl IntoIterator<Item = &'a User>) -> Self {
        let mut stats = Self::default();
        for user in users {
            stats.total += 1;
            if user.deleted_at.is_some() {
                stats.deactivated += 1;
                continue;
            }
            stats.active += 1;
            if user.has_verified_email() {
                stats.verified += 1;
            } else {
                stats.unverified += 1;
            }
            if user.is_admin {
                stats.admins += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyStatistics {
    pub total: usize,
    pub active: usize,
    pub deactivated: usize,
    /// Active companies with at least one active user.
    pub with_active_users: usize,
}

impl CompanyStatistics {
    pub fn compute(companies: &[Company], users: &[User]) -> Self {
        let mut stats = Self::default();
        for company in companies {
            stats.total += 1;
            if company.deleted_at.is_some() {
                stats.deactivated += 1;
                continue;
            }
            stats.active += 1;
            if users
                .iter()
                .any(|u| u.deleted_at.is_none() && u.company_id == Some(company.id))
            {
                stats.with_active_users += 1;
            }
        }
        stats
    }
}
