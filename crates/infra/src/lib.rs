//! Infrastructure: stores, the lifecycle service and its observer, listeners,
//! outbound mail/notifications, and process configuration.

pub mod audit;
pub mod config;
pub mod lifecycle;
pub mod listeners;
pub mod observers;
pub mod outbox;
pub mod store;

pub use audit::{AuditEntry, AuditLog};
pub use config::{AppConfig, ConfigWarning, LoadedConfig};
pub use lifecycle::{LifecycleError, ModelLifecycle};
pub use observers::{CompanyMembers, DetachDependents, ModelPropagator, RevokeCredentials, TokenRevoker};
pub use outbox::{InMemoryOutbox, Mail, Mailer, Notification, Notifier};
pub use store::{InMemoryModelStore, InMemoryTokenStore, ModelStore, StoreError, Trashed};
