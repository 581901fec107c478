//! Record storage behind traits; in-memory implementations for dev/tests.

pub mod memory;
pub mod tokens;

use std::sync::Arc;

use thiserror::Error;

use adminhub_core::Model;

pub use memory::InMemoryModelStore;
pub use tokens::InMemoryTokenStore;

/// Soft-deletion scope for queries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Trashed {
    /// Live records only.
    #[default]
    Without,
    /// Live and soft-deleted records.
    With,
    /// Soft-deleted records only.
    Only,
}

impl Trashed {
    pub fn admits<M: Model>(self, model: &M) -> bool {
        match self {
            Trashed::Without => !model.is_trashed(),
            Trashed::With => true,
            Trashed::Only => model.is_trashed(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique attribute is already taken (trashed rows included).
    #[error("{field} '{value}' is already taken")]
    Duplicate { field: &'static str, value: String },

    #[error("record not found")]
    Missing,

    /// The record exists but its current state is outside the expected scope.
    #[error("record changed concurrently")]
    Stale,

    #[error("store lock poisoned")]
    Poisoned,
}

pub trait ModelStore<M: Model>: Send + Sync {
    fn insert(&self, model: M) -> Result<M, StoreError>;

    /// Replace an existing record (matched by id).
    fn save(&self, model: M) -> Result<M, StoreError>;

    /// Rewrite the current row under `id` in one step, provided it is still
    /// admitted by `expect`. Fails with [`StoreError::Stale`] otherwise.
    fn modify(
        &self,
        id: &M::Id,
        expect: Trashed,
        apply: &mut dyn FnMut(&mut M),
    ) -> Result<M, StoreError>;

    /// Fetch by internal id, trashed records included.
    fn get(&self, id: &M::Id) -> Result<Option<M>, StoreError>;

    fn find_by_key(&self, key: &str, trashed: Trashed) -> Result<Option<M>, StoreError>;

    /// Lookup by one of [`Model::unique_fields`].
    fn find_by_unique(
        &self,
        field: &str,
        value: &str,
        trashed: Trashed,
    ) -> Result<Option<M>, StoreError>;

    /// Records in route-key order.
    fn list(&self, trashed: Trashed) -> Result<Vec<M>, StoreError>;

    /// Physically delete a record. Returns it if it existed.
    fn remove(&self, id: &M::Id) -> Result<Option<M>, StoreError>;
}

impl<M, S> ModelStore<M> for Arc<S>
where
    M: Model,
    S: ModelStore<M> + ?Sized,
{
    fn insert(&self, model: M) -> Result<M, StoreError> {
        (**self).insert(model)
    }

    fn save(&self, model: M) -> Result<M, StoreError> {
        (**self).save(model)
    }

    fn modify(
        &self,
        id: &M::Id,
        expect: Trashed,
        apply: &mut dyn FnMut(&mut M),
    ) -> Result<M, StoreError> {
        (**self).modify(id, expect, apply)
    }

    fn get(&self, id: &M::Id) -> Result<Option<M>, StoreError> {
        (**self).get(id)
    }

    fn find_by_key(&self, key: &str, trashed: Trashed) -> Result<Option<M>, StoreError> {
        (**self).find_by_key(key, trashed)
    }

    fn find_by_unique(
        &self,
        field: &str,
        value: &str,
        trashed: Trashed,
    ) -> Result<Option<M>, StoreError> {
        (**self).find_by_unique(field, value, trashed)
    }

    fn list(&self, trashed: Trashed) -> Result<Vec<M>, StoreError> {
        (**self).list(trashed)
    }

    fn remove(&self, id: &M::Id) -> Result<Option<M>, StoreError> {
        (**self).remove(id)
    }
}
