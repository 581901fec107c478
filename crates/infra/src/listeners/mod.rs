//! Listeners reacting to lifecycle events, and their per-model registration.

mod audit_log;
mod notify_admins;
mod welcome;

use std::sync::Arc;

use adminhub_directory::{Company, User};
use adminhub_events::{EventKind, ListenerRegistry};

use crate::audit::AuditLog;
use crate::outbox::{Mailer, Notifier};
use crate::store::ModelStore;

pub use audit_log::WriteAuditLog;
pub use notify_admins::NotifyAdministrators;
pub use welcome::SendWelcomeEmail;

const AUDITED: [EventKind; 3] = [EventKind::Updated, EventKind::Deleted, EventKind::Restored];

/// Shared collaborators handed to every listener.
#[derive(Clone)]
pub struct ListenerDeps {
    pub users: Arc<dyn ModelStore<User>>,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn Notifier>,
    pub audit: Arc<AuditLog>,
    pub app_url: String,
    pub app_key: String,
}

pub fn user_listeners(deps: &ListenerDeps) -> ListenerRegistry<User> {
    let audit = Arc::new(WriteAuditLog::new(deps.audit.clone()));

    let mut registry = ListenerRegistry::<User>::new();
    registry
        .listen(
            EventKind::Created,
            Arc::new(SendWelcomeEmail::new(
                deps.mailer.clone(),
                deps.app_url.clone(),
                deps.app_key.clone(),
            )),
        )
        .listen(
            EventKind::Created,
            Arc::new(NotifyAdministrators::new(deps.users.clone(), deps.notifier.clone())),
        )
        .listen(EventKind::Created, audit.clone())
        .listen_all(&AUDITED, audit);
    registry
}

pub fn company_listeners(deps: &ListenerDeps) -> ListenerRegistry<Company> {
    let audit = Arc::new(WriteAuditLog::new(deps.audit.clone()));

    let mut registry = ListenerRegistry::<Company>::new();
    registry
        .listen(
            EventKind::Created,
            Arc::new(NotifyAdministrators::new(deps.users.clone(), deps.notifier.clone())),
        )
        .listen(EventKind::Created, audit.clone())
        .listen_all(&AUDITED, audit);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::InMemoryOutbox;
    use crate::store::InMemoryModelStore;

    fn deps() -> ListenerDeps {
        let outbox = Arc::new(InMemoryOutbox::new());
        ListenerDeps {
            users: Arc::new(InMemoryModelStore::<User>::new()),
            mailer: outbox.clone(),
            notifier: outbox,
            audit: Arc::new(AuditLog::new()),
            app_url: "http://localhost:8080".to_string(),
            app_key: "key".to_string(),
        }
    }

    #[test]
    fn user_registration_order() {
        let registry = user_listeners(&deps());

        assert_eq!(
            registry.names_for(EventKind::Created),
            vec!["send_welcome_email", "notify_administrators", "write_audit_log"]
        );
        for kind in AUDITED {
            assert_eq!(registry.names_for(kind), vec!["write_audit_log"]);
        }
        assert!(registry.names_for(EventKind::ForceDeleted).is_empty());
    }

    #[test]
    fn company_registration_order() {
        let registry = company_listeners(&deps());

        assert_eq!(
            registry.names_for(EventKind::Created),
            vec!["notify_administrators", "write_audit_log"]
        );
        assert_eq!(registry.names_for(EventKind::Deleted), vec!["write_audit_log"]);
    }
}
