//! Lifecycle propagation: structured logs, domain events, and credential
//! revocation for soft-deleted accounts.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;

use adminhub_auth::TokenStore;
use adminhub_core::Model;
use adminhub_directory::{Company, User};
use adminhub_events::{DomainEvent, EventKind, ModelObserver, ObserverError};

use crate::store::{ModelStore, Trashed};

/// Revokes every credential belonging to a record.
pub trait RevokeCredentials<M>: Send + Sync {
    /// Returns how many credentials were revoked.
    fn revoke_all(&self, model: &M) -> anyhow::Result<usize>;
}

/// Revokes a user's personal access tokens.
pub struct TokenRevoker<S> {
    tokens: S,
}

impl<S> TokenRevoker<S> {
    pub fn new(tokens: S) -> Self {
        Self { tokens }
    }
}

impl<S: TokenStore> RevokeCredentials<User> for TokenRevoker<S> {
    fn revoke_all(&self, user: &User) -> anyhow::Result<usize> {
        Ok(self.tokens.revoke_all_for(user.id)?)
    }
}

/// Clears references other records hold to a permanently deleted record.
pub trait DetachDependents<M>: Send + Sync {
    /// Returns how many records were detached.
    fn detach_all(&self, model: &M) -> anyhow::Result<usize>;
}

/// Unassigns the members of a removed company, trashed members included.
pub struct CompanyMembers {
    users: Arc<dyn ModelStore<User>>,
}

impl CompanyMembers {
    pub fn new(users: Arc<dyn ModelStore<User>>) -> Self {
        Self { users }
    }
}

impl DetachDependents<Company> for CompanyMembers {
    fn detach_all(&self, company: &Company) -> anyhow::Result<usize> {
        let now = Utc::now();
        let members = self
            .users
            .list(Trashed::With)?
            .into_iter()
            .filter(|user| user.company_id == Some(company.id));

        let mut detached = 0;
        for member in members {
            self.users.modify(&member.id, Trashed::With, &mut |row| {
                if row.company_id == Some(company.id) {
                    row.company_id = None;
                    row.touch(now);
                }
            })?;
            detached += 1;
        }
        Ok(detached)
    }
}

/// The observer wired to every lifecycle-managed model.
///
/// With a revoker attached, a soft delete only stands once every credential of
/// the record is gone.
pub struct ModelPropagator<M> {
    revoker: Option<Arc<dyn RevokeCredentials<M>>>,
    dependents: Option<Arc<dyn DetachDependents<M>>>,
    _model: PhantomData<fn(M)>,
}

impl<M: Model> ModelPropagator<M> {
    pub fn new() -> Self {
        Self {
            revoker: None,
            dependents: None,
            _model: PhantomData,
        }
    }

    pub fn with_revoker(revoker: Arc<dyn RevokeCredentials<M>>) -> Self {
        Self {
            revoker: Some(revoker),
            ..Self::new()
        }
    }

    /// Detach dependent records when this model is permanently deleted.
    pub fn detaching(mut self, dependents: Arc<dyn DetachDependents<M>>) -> Self {
        self.dependents = Some(dependents);
        self
    }
}

impl<M: Model> Default for ModelPropagator<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> ModelObserver<M> for ModelPropagator<M> {
    fn creating(&self, model: &M) {
        tracing::info!(model = M::NAME, key = model.route_key(), "creating record");
    }

    fn created(&self, model: &M) -> Vec<DomainEvent<M>> {
        tracing::info!(model = M::NAME, key = model.route_key(), id = %model.id(), "record created");
        vec![DomainEvent::new(EventKind::Created, model.clone(), Utc::now())]
    }

    fn updating(&self, model: &M, changed: &[&'static str]) {
        tracing::info!(model = M::NAME, key = model.route_key(), changed = ?changed, "updating record");
    }

    fn updated(&self, model: &M, changed: &[&'static str]) -> Vec<DomainEvent<M>> {
        tracing::info!(model = M::NAME, key = model.route_key(), changed = ?changed, "record updated");
        vec![DomainEvent::updated(model.clone(), changed.to_vec(), Utc::now())]
    }

    fn deleting(&self, model: &M) {
        tracing::warn!(model = M::NAME, key = model.route_key(), "deleting record");
    }

    fn deleted(&self, model: &M) -> Result<Vec<DomainEvent<M>>, ObserverError> {
        tracing::warn!(model = M::NAME, key = model.route_key(), "record soft-deleted");

        if let Some(revoker) = &self.revoker {
            let revoked = revoker
                .revoke_all(model)
                .map_err(|e| ObserverError::CredentialRevocation(format!("{e:#}")))?;
            tracing::warn!(model = M::NAME, key = model.route_key(), revoked, "credentials revoked");
        }

        Ok(vec![DomainEvent::new(EventKind::Deleted, model.clone(), Utc::now())])
    }

    fn restored(&self, model: &M) -> Vec<DomainEvent<M>> {
        tracing::info!(model = M::NAME, key = model.route_key(), "record restored");
        vec![DomainEvent::new(EventKind::Restored, model.clone(), Utc::now())]
    }

    fn force_deleted(&self, model: &M) -> Vec<DomainEvent<M>> {
        tracing::warn!(model = M::NAME, key = model.route_key(), id = %model.id(), "record permanently deleted");

        // Storage cascade for credentials left over from a never-soft-deleted record.
        if let Some(revoker) = &self.revoker {
            if let Err(e) = revoker.revoke_all(model) {
                let error = format!("{e:#}");
                tracing::error!(model = M::NAME, key = model.route_key(), error = %error, "failed to purge credentials");
            }
        }
        if let Some(dependents) = &self.dependents {
            match dependents.detach_all(model) {
                Ok(detached) => {
                    tracing::info!(model = M::NAME, key = model.route_key(), detached, "dependents detached")
                }
                Err(e) => {
                    let error = format!("{e:#}");
                    tracing::error!(model = M::NAME, key = model.route_key(), error = %error, "failed to detach dependents");
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use adminhub_auth::NewAccessToken;
    use adminhub_directory::{NewCompany, NewUser};

    use super::*;
    use crate::store::{InMemoryModelStore, InMemoryTokenStore};

    struct BrokenRevoker;

    impl RevokeCredentials<User> for BrokenRevoker {
        fn revoke_all(&self, _model: &User) -> anyhow::Result<usize> {
            anyhow::bail!("token table offline")
        }
    }

    fn user() -> User {
        User::create(
            NewUser {
                username: "ada".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: String::new(),
                company_id: None,
                is_admin: false,
                email_verified: true,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn deleted_revokes_tokens_and_emits_one_event() {
        let tokens = Arc::new(InMemoryTokenStore::new());
        let ada = user();
        for _ in 0..3 {
            tokens
                .insert(NewAccessToken::generate(ada.id, "t", Utc::now(), None).token)
                .unwrap();
        }
        let propagator = ModelPropagator::<User>::with_revoker(Arc::new(TokenRevoker::new(tokens.clone())));

        let events = propagator.deleted(&ada).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::Deleted);
        assert_eq!(tokens.count_for(ada.id).unwrap(), 0);
    }

    #[test]
    fn deleted_surfaces_revocation_failure() {
        let propagator = ModelPropagator::<User>::with_revoker(Arc::new(BrokenRevoker));
        let err = propagator.deleted(&user()).unwrap_err();
        assert!(err.to_string().contains("token table offline"));
    }

    #[test]
    fn before_hooks_emit_nothing_and_force_delete_is_silent() {
        let propagator = ModelPropagator::<User>::new();
        let ada = user();
        assert_eq!(propagator.created(&ada)[0].kind(), EventKind::Created);
        assert_eq!(propagator.updated(&ada, &["name"])[0].changed(), &["name"]);
        assert_eq!(propagator.restored(&ada)[0].kind(), EventKind::Restored);
        assert!(propagator.force_deleted(&ada).is_empty());
    }

    #[test]
    fn force_deleting_a_company_detaches_its_members() {
        let users = Arc::new(InMemoryModelStore::<User>::new());
        let acme = Company::create(
            NewCompany {
                name: "Acme".to_string(),
                slug: None,
                email: None,
            },
            Utc::now(),
        )
        .unwrap();

        let mut member = user();
        member.company_id = Some(acme.id);
        member.deleted_at = Some(Utc::now());
        let member = users.insert(member).unwrap();

        let propagator =
            ModelPropagator::<Company>::new().detaching(Arc::new(CompanyMembers::new(users.clone())));
        assert!(propagator.force_deleted(&acme).is_empty());

        let stored = users.get(&member.id).unwrap().unwrap();
        assert_eq!(stored.company_id, None);
        assert!(stored.deleted_at.is_some());
    }
}
