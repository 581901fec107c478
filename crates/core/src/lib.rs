//! `adminhub-core` — domain building blocks shared by every adminhub crate.
//!
//! Pure domain primitives only: identifiers, the error model, and the traits
//! that lifecycle-managed records implement.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, Model};
pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, TokenId, UserId};
