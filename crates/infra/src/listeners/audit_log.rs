use std::sync::Arc;

use adminhub_core::Model;
use adminhub_events::{DomainEvent, Listener};

use crate::audit::{AuditEntry, AuditLog};

pub struct WriteAuditLog {
    log: Arc<AuditLog>,
}

impl WriteAuditLog {
    pub fn new(log: Arc<AuditLog>) -> Self {
        Self { log }
    }
}

impl<M: Model> Listener<M> for WriteAuditLog {
    fn name(&self) -> &'static str {
        "write_audit_log"
    }

    fn handle(&self, event: &DomainEvent<M>) -> anyhow::Result<()> {
        self.log.append(AuditEntry::from_event(event))
    }
}
