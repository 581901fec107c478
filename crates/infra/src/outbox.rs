//! Outbound mail and in-app notifications.
//!
//! No transport is wired; [`InMemoryOutbox`] keeps what would have been sent.

use std::sync::RwLock;

use serde::Serialize;

use adminhub_core::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    mails: RwLock<Vec<Mail>>,
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mails(&self) -> Vec<Mail> {
        self.mails.read().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Mailer for InMemoryOutbox {
    fn send(&self, mail: Mail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "mail queued");
        self.mails
            .write()
            .map_err(|_| anyhow::anyhow!("outbox lock poisoned"))?
            .push(mail);
        Ok(())
    }
}

impl Notifier for InMemoryOutbox {
    fn notify(&self, notification: Notification) -> anyhow::Result<()> {
        tracing::info!(recipient = %notification.recipient, subject = %notification.subject, "notification stored");
        self.notifications
            .write()
            .map_err(|_| anyhow::anyhow!("outbox lock poisoned"))?
            .push(notification);
        Ok(())
    }
}
