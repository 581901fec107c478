use chrono::{DateTime, Utc};
use serde::Serialize;

use adminhub_core::{TokenId, UserId};

/// The authenticated actor attached to a request.
///
/// Built by the credential resolver from the token owner, soft-deleted owners
/// included: the gate, not the resolver, decides what a deleted account may do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub is_admin: bool,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Token that authenticated this request.
    pub token_id: TokenId,
}

impl Principal {
    pub fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }

    pub fn is_deactivated(&self) -> bool {
        self.deleted_at.is_some()
    }
}
