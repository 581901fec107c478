//! Entity and lifecycle-managed model traits.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// A soft-deletable record whose mutations go through the lifecycle hooks.
///
/// `route_key` is the external identifier used in URLs (username, slug), which
/// is distinct from the internal id.
pub trait Model: Entity + Clone + core::fmt::Debug + Serialize + Send + Sync + 'static {
    /// Short lowercase model name used in event types and logs (e.g. "user").
    const NAME: &'static str;

    /// Returns the external lookup key.
    fn route_key(&self) -> &str;

    /// Soft-deletion timestamp; `Some` means the record is trashed.
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Set or clear the soft-deletion timestamp.
    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Stamp the last-modified time.
    fn touch(&mut self, at: DateTime<Utc>);

    /// Names of the attributes that differ between `original` and `self`.
    ///
    /// Bookkeeping timestamps (`updated_at`, `deleted_at`) are never reported.
    fn changed_fields(&self, original: &Self) -> Vec<&'static str>;

    /// Unique attributes other than the route key, as `(field, value)` pairs.
    fn unique_fields(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn is_trashed(&self) -> bool {
        self.deleted_at().is_some()
    }
}
