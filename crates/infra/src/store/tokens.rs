use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use adminhub_auth::{PersonalAccessToken, TokenStore, TokenStoreError};
use adminhub_core::{TokenId, UserId};

/// In-memory personal access token table.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<HashMap<TokenId, PersonalAccessToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> TokenStoreError {
    TokenStoreError::Unavailable("token table lock poisoned".to_string())
}

impl TokenStore for InMemoryTokenStore {
    fn insert(&self, token: PersonalAccessToken) -> Result<(), TokenStoreError> {
        let mut tokens = self.inner.write().map_err(|_| poisoned())?;
        tokens.insert(token.id, token);
        Ok(())
    }

    fn get(&self, id: TokenId) -> Result<Option<PersonalAccessToken>, TokenStoreError> {
        let tokens = self.inner.read().map_err(|_| poisoned())?;
        Ok(tokens.get(&id).cloned())
    }

    fn touch(&self, id: TokenId, at: DateTime<Utc>) -> Result<(), TokenStoreError> {
        let mut tokens = self.inner.write().map_err(|_| poisoned())?;
        if let Some(token) = tokens.get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    fn revoke(&self, id: TokenId) -> Result<bool, TokenStoreError> {
        let mut tokens = self.inner.write().map_err(|_| poisoned())?;
        Ok(tokens.remove(&id).is_some())
    }

    fn revoke_all_for(&self, user_id: UserId) -> Result<usize, TokenStoreError> {
        let mut tokens = self.inner.write().map_err(|_| poisoned())?;
        let before = tokens.len();
        tokens.retain(|_, token| token.user_id != user_id);
        Ok(before - tokens.len())
    }

    fn count_for(&self, user_id: UserId) -> Result<usize, TokenStoreError> {
        let tokens = self.inner.read().map_err(|_| poisoned())?;
        Ok(tokens.values().filter(|t| t.user_id == user_id).count())
    }
}
