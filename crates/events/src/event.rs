use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use adminhub_core::Model;

/// A domain-agnostic event.
///
/// Events are facts: once built they are never mutated.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "user.created").
    fn event_type(&self) -> String;

    /// When the transition happened.
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Lifecycle transition that produced an event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
    Restored,
    ForceDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Created,
        EventKind::Updated,
        EventKind::Deleted,
        EventKind::Restored,
        EventKind::ForceDeleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::Restored => "restored",
            EventKind::ForceDeleted => "force_deleted",
        }
    }

    /// Position in [`EventKind::ALL`]; used as a slot index by the registry.
    pub(crate) fn index(self) -> usize {
        match self {
            EventKind::Created => 0,
            EventKind::Updated => 1,
            EventKind::Deleted => 2,
            EventKind::Restored => 3,
            EventKind::ForceDeleted => 4,
        }
    }

    /// Terminal kinds never reach listeners.
    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::ForceDeleted)
    }

    /// Security-relevant kinds are always delivered inline, whatever the
    /// configured dispatch mode.
    pub fn requires_sync_dispatch(self) -> bool {
        matches!(self, EventKind::Deleted)
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of a completed lifecycle transition.
///
/// Carries a snapshot of the model as it was right after the transition.
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent<M> {
    event_id: Uuid,
    kind: EventKind,
    model: M,
    changed: Vec<&'static str>,
    occurred_at: DateTime<Utc>,
}

impl<M: Model> DomainEvent<M> {
    pub fn new(kind: EventKind, model: M, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            kind,
            model,
            changed: Vec::new(),
            occurred_at,
        }
    }

    /// An `Updated` event listing the attributes that changed.
    pub fn updated(model: M, changed: Vec<&'static str>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            changed,
            ..Self::new(EventKind::Updated, model, occurred_at)
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn changed(&self) -> &[&'static str] {
        &self.changed
    }
}

impl<M: Model> Event for DomainEvent<M> {
    fn event_type(&self) -> String {
        format!("{}.{}", M::NAME, self.kind.as_str())
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
