//! Explicit lifecycle hooks called by the mutation layer.
//!
//! "Before" hooks are observational. "After" hooks return the events to
//! dispatch; the caller decides when to hand them to the dispatcher.

use thiserror::Error;

use adminhub_core::Model;

use crate::event::DomainEvent;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    /// Credentials of a soft-deleted record could not be revoked.
    #[error("credential revocation failed: {0}")]
    CredentialRevocation(String),
}

pub trait ModelObserver<M: Model>: Send + Sync {
    fn creating(&self, _model: &M) {}

    fn created(&self, model: &M) -> Vec<DomainEvent<M>>;

    fn updating(&self, _model: &M, _changed: &[&'static str]) {}

    fn updated(&self, model: &M, changed: &[&'static str]) -> Vec<DomainEvent<M>>;

    fn deleting(&self, _model: &M) {}

    /// Runs after a soft delete. An error means the delete must not stand.
    fn deleted(&self, model: &M) -> Result<Vec<DomainEvent<M>>, ObserverError>;

    fn restored(&self, model: &M) -> Vec<DomainEvent<M>>;

    fn force_deleted(&self, _model: &M) -> Vec<DomainEvent<M>> {
        Vec::new()
    }
}
