use std::sync::Arc;

use adminhub_auth::verification_signature;
use adminhub_directory::User;
use adminhub_events::{DomainEvent, Listener};

use crate::outbox::{Mail, Mailer};

/// Mails a new account a welcome message, with a verification link while the
/// address is unverified.
pub struct SendWelcomeEmail {
    mailer: Arc<dyn Mailer>,
    app_url: String,
    app_key: String,
}

impl SendWelcomeEmail {
    pub fn new(mailer: Arc<dyn Mailer>, app_url: String, app_key: String) -> Self {
        Self {
            mailer,
            app_url,
            app_key,
        }
    }

    pub fn verification_url(&self, user: &User) -> anyhow::Result<String> {
        let signature = verification_signature(&self.app_key, user.id, &user.email)?;
        Ok(format!(
            "{}/api/v1/auth/email/verify/{}/{}",
            self.app_url.trim_end_matches('/'),
            user.id,
            signature
        ))
    }
}

impl Listener<User> for SendWelcomeEmail {
    fn name(&self) -> &'static str {
        "send_welcome_email"
    }

    fn handle(&self, event: &DomainEvent<User>) -> anyhow::Result<()> {
        let user = event.model();
        let mut body = format!("Hello {}, welcome aboard.", user.name);
        if !user.has_verified_email() {
            body.push_str("\n\nPlease confirm your email address: ");
            body.push_str(&self.verification_url(user)?);
        }

        self.mailer.send(Mail {
            to: user.email.clone(),
            subject: "Welcome".to_string(),
            body,
        })
    }
}
