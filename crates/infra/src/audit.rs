//! Append-only audit trail of lifecycle events.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use adminhub_core::Model;
use adminhub_events::{DomainEvent, Event};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub event_id: Uuid,
    pub event_type: String,
    pub model: &'static str,
    pub key: String,
    pub changed: Vec<&'static str>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn from_event<M: Model>(event: &DomainEvent<M>) -> Self {
        Self {
            event_id: event.event_id(),
            event_type: event.event_type(),
            model: M::NAME,
            key: event.model().route_key().to_string(),
            changed: event.changed().to_vec(),
            occurred_at: event.occurred_at(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, entry: AuditEntry) -> anyhow::Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow::anyhow!("audit log lock poisoned"))?
            .push(entry);
        Ok(())
    }

    /// All entries in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn for_key(&self, model: &str, key: &str) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.model == model && e.key == key)
            .collect()
    }
}
