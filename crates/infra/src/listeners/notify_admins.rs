use std::sync::Arc;

use adminhub_core::Model;
use adminhub_directory::User;
use adminhub_events::{DomainEvent, Listener};

use crate::outbox::{Notification, Notifier};
use crate::store::{ModelStore, Trashed};

/// Tells every active, verified administrator about a new record. A new admin
/// account is not told about itself.
pub struct NotifyAdministrators {
    users: Arc<dyn ModelStore<User>>,
    notifier: Arc<dyn Notifier>,
}

impl NotifyAdministrators {
    pub fn new(users: Arc<dyn ModelStore<User>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { users, notifier }
    }
}

impl<M: Model> Listener<M> for NotifyAdministrators {
    fn name(&self) -> &'static str {
        "notify_administrators"
    }

    fn handle(&self, event: &DomainEvent<M>) -> anyhow::Result<()> {
        let key = event.model().route_key();
        let admins = self
            .users
            .list(Trashed::Without)?
            .into_iter()
            .filter(User::receives_admin_notifications)
            .filter(|admin| !(M::NAME == User::NAME && admin.username == key));

        let mut notified = 0usize;
        for admin in admins {
            self.notifier.notify(Notification {
                recipient: admin.id,
                subject: format!("New {} created", M::NAME),
                body: format!("{} '{}' was created.", M::NAME, key),
            })?;
            notified += 1;
        }

        tracing::debug!(model = M::NAME, key, notified, "administrators notified");
        Ok(())
    }
}
