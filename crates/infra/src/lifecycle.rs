//! Mutation pipeline for lifecycle-managed records.
//!
//! ```text
//! before hook → store mutation → after hook → dispatch returned events
//! ```
//!
//! Hooks run synchronously inside each call. Listener outcomes never change
//! the result of a mutation; a failed credential revocation after a soft
//! delete does, and rolls the delete back.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use adminhub_core::{DomainError, DomainResult, Model};
use adminhub_events::{EventDispatcher, ModelObserver, ObserverError};

use crate::store::{ModelStore, StoreError, Trashed};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// The soft delete was rolled back because credentials could not be revoked.
    #[error("credential revocation failed: {0}")]
    CredentialRevocation(String),

    #[error("store error: {0}")]
    Store(String),
}

impl From<DomainError> for LifecycleError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => LifecycleError::Validation(msg),
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate { field, value } => {
                LifecycleError::Conflict(format!("{field} '{value}' is already taken"))
            }
            StoreError::Missing => LifecycleError::NotFound("record"),
            StoreError::Stale => LifecycleError::Conflict(value.to_string()),
            StoreError::Poisoned => LifecycleError::Store(value.to_string()),
        }
    }
}

impl From<ObserverError> for LifecycleError {
    fn from(value: ObserverError) -> Self {
        match value {
            ObserverError::CredentialRevocation(msg) => LifecycleError::CredentialRevocation(msg),
        }
    }
}

/// Entity-mutation component: the only path that changes a `M` record.
pub struct ModelLifecycle<M: Model> {
    store: Arc<dyn ModelStore<M>>,
    observer: Arc<dyn ModelObserver<M>>,
    dispatcher: EventDispatcher<M>,
}

impl<M: Model> ModelLifecycle<M> {
    pub fn new(
        store: Arc<dyn ModelStore<M>>,
        observer: Arc<dyn ModelObserver<M>>,
        dispatcher: EventDispatcher<M>,
    ) -> Self {
        Self {
            store,
            observer,
            dispatcher,
        }
    }

    pub fn store(&self) -> &dyn ModelStore<M> {
        self.store.as_ref()
    }

    pub fn dispatcher(&self) -> &EventDispatcher<M> {
        &self.dispatcher
    }

    pub fn find(&self, key: &str, trashed: Trashed) -> Result<M, LifecycleError> {
        self.store
            .find_by_key(key, trashed)?
            .ok_or(LifecycleError::NotFound(M::NAME))
    }

    pub fn list(&self, trashed: Trashed) -> Result<Vec<M>, LifecycleError> {
        Ok(self.store.list(trashed)?)
    }

    pub fn create(&self, model: M) -> Result<M, LifecycleError> {
        self.observer.creating(&model);
        let model = self.store.insert(model)?;
        self.dispatcher.dispatch(self.observer.created(&model));
        Ok(model)
    }

    /// Update the live record under `key`. Nothing happens if no attribute changed.
    pub fn update<F>(&self, key: &str, mutate: F) -> Result<M, LifecycleError>
    where
        F: FnOnce(&mut M) -> DomainResult<()>,
    {
        let original = self.find(key, Trashed::Without)?;
        self.update_model(original, mutate)
    }

    /// Update by internal id (live records only).
    pub fn update_by_id<F>(&self, id: &M::Id, mutate: F) -> Result<M, LifecycleError>
    where
        F: FnOnce(&mut M) -> DomainResult<()>,
    {
        let original = self
            .store
            .get(id)?
            .filter(|m| !m.is_trashed())
            .ok_or(LifecycleError::NotFound(M::NAME))?;
        self.update_model(original, mutate)
    }

    fn update_model<F>(&self, original: M, mutate: F) -> Result<M, LifecycleError>
    where
        F: FnOnce(&mut M) -> DomainResult<()>,
    {
        let mut model = original.clone();
        mutate(&mut model)?;

        let changed = model.changed_fields(&original);
        if changed.is_empty() {
            tracing::debug!(model = M::NAME, key = original.route_key(), "update without changes");
            return Ok(original);
        }

        self.observer.updating(&model, &changed);
        model.touch(Utc::now());
        // A record trashed since it was read stays trashed.
        let model = self
            .store
            .modify(original.id(), Trashed::Without, &mut |row| *row = model.clone())
            .map_err(|e| match e {
                StoreError::Stale => LifecycleError::NotFound(M::NAME),
                other => other.into(),
            })?;
        self.dispatcher.dispatch(self.observer.updated(&model, &changed));
        Ok(model)
    }

    /// Soft delete. Returns once credentials are revoked and `Deleted` is dispatched.
    ///
    /// The live → trashed transition is checked and written under the store
    /// lock, so concurrent deletes of one record yield a single success.
    pub fn delete(&self, key: &str) -> Result<M, LifecycleError> {
        let original = self.find(key, Trashed::Without)?;
        self.observer.deleting(&original);

        let now = Utc::now();
        let model = self
            .store
            .modify(original.id(), Trashed::Without, &mut |row| {
                row.set_deleted_at(Some(now));
                row.touch(now);
            })
            .map_err(|e| match e {
                StoreError::Stale => LifecycleError::NotFound(M::NAME),
                other => other.into(),
            })?;

        match self.observer.deleted(&model) {
            Ok(events) => {
                self.dispatcher.dispatch(events);
                Ok(model)
            }
            Err(e) => {
                tracing::error!(model = M::NAME, key = model.route_key(), error = %e, "soft delete rolled back");
                let rollback = self
                    .store
                    .modify(original.id(), Trashed::Only, &mut |row| *row = original.clone());
                if let Err(rollback) = rollback {
                    tracing::error!(model = M::NAME, key = model.route_key(), error = %rollback, "rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Undo a soft delete. Restoring a live record is a conflict and emits nothing.
    pub fn restore(&self, key: &str) -> Result<M, LifecycleError> {
        let original = self.find(key, Trashed::With)?;
        let not_deleted = || {
            LifecycleError::Conflict(format!(
                "{} '{}' is not deleted",
                M::NAME,
                original.route_key()
            ))
        };
        if !original.is_trashed() {
            return Err(not_deleted());
        }

        let now = Utc::now();
        let model = self
            .store
            .modify(original.id(), Trashed::Only, &mut |row| {
                row.set_deleted_at(None);
                row.touch(now);
            })
            .map_err(|e| match e {
                StoreError::Stale => not_deleted(),
                other => other.into(),
            })?;
        self.dispatcher.dispatch(self.observer.restored(&model));
        Ok(model)
    }

    /// Permanently remove a live or trashed record.
    pub fn force_delete(&self, key: &str) -> Result<M, LifecycleError> {
        let model = self.find(key, Trashed::With)?;
        let removed = self
            .store
            .remove(model.id())?
            .ok_or(LifecycleError::NotFound(M::NAME))?;
        self.dispatcher.dispatch(self.observer.force_deleted(&removed));
        Ok(removed)
    }
}
