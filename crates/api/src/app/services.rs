//! Service wiring: stores, lifecycles, listeners and token issuance.

use std::sync::Arc;

use chrono::Utc;

use adminhub_auth::{NewAccessToken, Principal, TokenStore, TokenStoreError};
use adminhub_directory::{Company, User};
use adminhub_events::EventDispatcher;
use adminhub_infra::listeners::{self, ListenerDeps};
use adminhub_infra::{
    AppConfig, AuditLog, CompanyMembers, InMemoryModelStore, InMemoryOutbox, InMemoryTokenStore,
    ModelLifecycle, ModelPropagator, TokenRevoker,
};

pub struct AppServices {
    pub config: AppConfig,
    pub users: ModelLifecycle<User>,
    pub companies: ModelLifecycle<Company>,
    pub tokens: Arc<InMemoryTokenStore>,
    pub outbox: Arc<InMemoryOutbox>,
    pub audit: Arc<AuditLog>,
}

pub fn build_services(config: AppConfig) -> AppServices {
    let user_store = Arc::new(InMemoryModelStore::<User>::new());
    let company_store = Arc::new(InMemoryModelStore::<Company>::new());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let outbox = Arc::new(InMemoryOutbox::new());
    let audit = Arc::new(AuditLog::new());

    let deps = ListenerDeps {
        users: user_store.clone(),
        mailer: outbox.clone(),
        notifier: outbox.clone(),
        audit: audit.clone(),
        app_url: config.app_url.clone(),
        app_key: config.app_key.clone(),
    };

    let users = ModelLifecycle::<User>::new(
        user_store.clone(),
        Arc::new(ModelPropagator::<User>::with_revoker(Arc::new(TokenRevoker::new(
            tokens.clone(),
        )))),
        EventDispatcher::with_mode(listeners::user_listeners(&deps), config.dispatch_mode),
    );
    let companies = ModelLifecycle::<Company>::new(
        company_store,
        Arc::new(
            ModelPropagator::<Company>::new().detaching(Arc::new(CompanyMembers::new(user_store.clone()))),
        ),
        EventDispatcher::with_mode(listeners::company_listeners(&deps), config.dispatch_mode),
    );

    tracing::info!(dispatch_mode = ?config.dispatch_mode, "services initialized");

    AppServices {
        config,
        users,
        companies,
        tokens,
        outbox,
        audit,
    }
}

impl AppServices {
    /// Issue a new personal access token for `user`.
    pub fn issue_token(&self, user: &User, name: &str) -> Result<NewAccessToken, TokenStoreError> {
        let issued = NewAccessToken::generate(user.id, name, Utc::now(), self.config.token_ttl);
        self.tokens.insert(issued.token.clone())?;
        tracing::info!(user = %user.username, token_id = %issued.token.id, "access token issued");
        Ok(issued)
    }

    /// Resolve a presented bearer token to its owner, soft-deleted owners included.
    ///
    /// Anything that does not resolve cleanly yields `None`.
    pub fn resolve_principal(&self, plain: &str) -> Option<Principal> {
        let now = Utc::now();
        let token = match self.tokens.find_valid(plain, now) {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(error = %e, "token lookup failed");
                return None;
            }
        };

        if let Err(e) = self.tokens.touch(token.id, now) {
            tracing::warn!(token_id = %token.id, error = %e, "failed to stamp token usage");
        }

        match self.users.store().get(&token.user_id) {
            Ok(Some(user)) => Some(user.to_principal(token.id)),
            Ok(None) => {
                tracing::warn!(token_id = %token.id, "token owner no longer exists");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "user lookup failed");
                None
            }
        }
    }
}
