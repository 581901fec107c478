//! Listener contract and the static registration table.

use std::sync::Arc;

use crate::event::{DomainEvent, EventKind};

/// Reacts to a domain event with a side effect (mail, notification, audit...).
///
/// Listeners must be stateless and safe to run twice for the same event. The
/// dispatcher contains failures per call, so an `Err` (or a panic) only affects
/// this listener.
pub trait Listener<M>: Send + Sync {
    /// Stable name used in logs and dispatch reports.
    fn name(&self) -> &'static str;

    fn handle(&self, event: &DomainEvent<M>) -> anyhow::Result<()>;
}

/// Ordered listener list per [`EventKind`].
///
/// Order of registration is the order of invocation.
pub struct ListenerRegistry<M> {
    slots: [Vec<Arc<dyn Listener<M>>>; 5],
}

impl<M> ListenerRegistry<M> {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// Append `listener` to the list for `kind`.
    pub fn listen(&mut self, kind: EventKind, listener: Arc<dyn Listener<M>>) -> &mut Self {
        self.slots[kind.index()].push(listener);
        self
    }

    /// Append `listener` to the list of every kind in `kinds`, in the given order.
    pub fn listen_all(&mut self, kinds: &[EventKind], listener: Arc<dyn Listener<M>>) -> &mut Self {
        for kind in kinds {
            self.listen(*kind, listener.clone());
        }
        self
    }

    pub fn listeners_for(&self, kind: EventKind) -> &[Arc<dyn Listener<M>>] {
        &self.slots[kind.index()]
    }

    /// Listener names for `kind`, in invocation order.
    pub fn names_for(&self, kind: EventKind) -> Vec<&'static str> {
        self.listeners_for(kind).iter().map(|l| l.name()).collect()
    }
}

impl<M> Default for ListenerRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> core::fmt::Debug for ListenerRegistry<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind.as_str(), &self.names_for(kind));
        }
        map.finish()
    }
}
