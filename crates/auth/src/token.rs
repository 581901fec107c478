//! Personal access tokens (opaque bearer credentials).
//!
//! The plaintext form is `"<token id>|<secret>"` and is shown exactly once, at
//! issuance. Only the SHA-256 hex digest of the secret is stored.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use adminhub_core::{TokenId, UserId};

const SECRET_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonalAccessToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub name: String,
    #[serde(skip_serializing)]
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token secret does not match")]
    SecretMismatch,
}

impl PersonalAccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Check a presented secret against this token at `now`.
    pub fn verify(&self, secret: &str, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
        if hash_token_secret(secret) != self.secret_hash {
            return Err(TokenValidationError::SecretMismatch);
        }
        if self.is_expired(now) {
            return Err(TokenValidationError::Expired);
        }
        Ok(())
    }
}

/// A freshly issued token together with its one-time plaintext.
#[derive(Debug, Clone)]
pub struct NewAccessToken {
    pub token: PersonalAccessToken,
    pub plain_text: String,
}

impl NewAccessToken {
    pub fn generate(
        user_id: UserId,
        name: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_LEN)
            .map(char::from)
            .collect();
        let id = TokenId::new();

        Self {
            token: PersonalAccessToken {
                id,
                user_id,
                name: name.into(),
                secret_hash: hash_token_secret(&secret),
                created_at: now,
                last_used_at: None,
                expires_at: ttl.map(|ttl| now + ttl),
            },
            plain_text: format!("{id}|{secret}"),
        }
    }
}

pub fn hash_token_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

/// Split a presented bearer value into its id and secret parts.
pub fn split_plain_token(plain: &str) -> Option<(TokenId, &str)> {
    let (id, secret) = plain.split_once('|')?;
    let id = id.parse().ok()?;
    if secret.is_empty() {
        return None;
    }
    Some((id, secret))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenStoreError {
    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for personal access tokens.
pub trait TokenStore: Send + Sync {
    fn insert(&self, token: PersonalAccessToken) -> Result<(), TokenStoreError>;

    fn get(&self, id: TokenId) -> Result<Option<PersonalAccessToken>, TokenStoreError>;

    fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), TokenStoreError>;

    /// Delete one token. Returns whether it existed.
    fn revoke(&self, id: TokenId) -> Result<bool, TokenStoreError>;

    /// Delete every token owned by `user_id`. Returns how many were removed.
    fn revoke_all_for(&self, user_id: UserId) -> Result<usize, TokenStoreError>;

    fn count_for(&self, user_id: UserId) -> Result<usize, TokenStoreError>;

    /// Resolve a presented plaintext token into a live token record.
    ///
    /// Unknown, malformed, mismatched, or expired tokens resolve to `None`.
    fn find_valid(
        &self,
        plain: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PersonalAccessToken>, TokenStoreError> {
        let Some((id, secret)) = split_plain_token(plain) else {
            tracing::debug!("malformed bearer token");
            return Ok(None);
        };
        let Some(token) = self.get(id)? else {
            return Ok(None);
        };
        match token.verify(secret, now) {
            Ok(()) => Ok(Some(token)),
            Err(e) => {
                tracing::debug!(token_id = %id, reason = %e, "bearer token rejected");
                Ok(None)
            }
        }
    }
}

impl<S> TokenStore for Arc<S>
where
    S: TokenStore + ?Sized,
{
    fn insert(&self, token: PersonalAccessToken) -> Result<(), TokenStoreError> {
        (**self).insert(token)
    }

    fn get(&self, id: TokenId) -> Result<Option<PersonalAccessToken>, TokenStoreError> {
        (**self).get(id)
    }

    fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), TokenStoreError> {
        (**self).touch(id, at)
    }

    fn revoke(&self, id: TokenId) -> Result<bool, TokenStoreError> {
        (**self).revoke(id)
    }

    fn revoke_all_for(&self, user_id: UserId) -> Result<usize, TokenStoreError> {
        (**self).revoke_all_for(user_id)
    }

    fn count_for(&self, user_id: UserId) -> Result<usize, TokenStoreError> {
        (**self).count_for(user_id)
    }
}
