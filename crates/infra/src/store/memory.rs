use std::collections::HashMap;
use std::sync::RwLock;

use adminhub_core::Model;

use super::{ModelStore, StoreError, Trashed};

/// In-memory record store for tests/dev.
///
/// Uniqueness of the route key and of [`Model::unique_fields`] is enforced
/// across live and trashed rows alike.
#[derive(Debug)]
pub struct InMemoryModelStore<M: Model> {
    inner: RwLock<HashMap<M::Id, M>>,
}

impl<M: Model> InMemoryModelStore<M> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<M: Model> Default for InMemoryModelStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_unique<M: Model>(rows: &HashMap<M::Id, M>, candidate: &M) -> Result<(), StoreError> {
    let others = rows.values().filter(|row| row.id() != candidate.id());

    for row in others {
        if row.route_key() == candidate.route_key() {
            return Err(StoreError::Duplicate {
                field: "key",
                value: candidate.route_key().to_string(),
            });
        }
        for (field, value) in candidate.unique_fields() {
            if row.unique_fields().iter().any(|(f, v)| *f == field && *v == value) {
                return Err(StoreError::Duplicate { field, value });
            }
        }
    }
    Ok(())
}

impl<M: Model> ModelStore<M> for InMemoryModelStore<M> {
    fn insert(&self, model: M) -> Result<M, StoreError> {
        let mut rows = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        ensure_unique(&*rows, &model)?;
        rows.insert(*model.id(), model.clone());
        Ok(model)
    }

    fn save(&self, model: M) -> Result<M, StoreError> {
        let mut rows = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        if !rows.contains_key(model.id()) {
            return Err(StoreError::Missing);
        }
        ensure_unique(&*rows, &model)?;
        rows.insert(*model.id(), model.clone());
        Ok(model)
    }

    fn modify(
        &self,
        id: &M::Id,
        expect: Trashed,
        apply: &mut dyn FnMut(&mut M),
    ) -> Result<M, StoreError> {
        let mut rows = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        let mut row = rows.get(id).cloned().ok_or(StoreError::Missing)?;
        if !expect.admits(&row) {
            return Err(StoreError::Stale);
        }
        apply(&mut row);
        ensure_unique(&*rows, &row)?;
        rows.insert(*row.id(), row.clone());
        Ok(row)
    }

    fn get(&self, id: &M::Id) -> Result<Option<M>, StoreError> {
        let rows = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.get(id).cloned())
    }

    fn find_by_key(&self, key: &str, trashed: Trashed) -> Result<Option<M>, StoreError> {
        let rows = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .values()
            .find(|row| row.route_key() == key && trashed.admits(*row))
            .cloned())
    }

    fn find_by_unique(
        &self,
        field: &str,
        value: &str,
        trashed: Trashed,
    ) -> Result<Option<M>, StoreError> {
        let rows = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .values()
            .find(|row| {
                trashed.admits(*row)
                    && row.unique_fields().iter().any(|(f, v)| *f == field && v == value)
            })
            .cloned())
    }

    fn list(&self, trashed: Trashed) -> Result<Vec<M>, StoreError> {
        let rows = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let mut out: Vec<M> = rows.values().filter(|row| trashed.admits(*row)).cloned().collect();
        out.sort_by(|a, b| a.route_key().cmp(b.route_key()));
        Ok(out)
    }

    fn remove(&self, id: &M::Id) -> Result<Option<M>, StoreError> {
        let mut rows = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use adminhub_directory::{NewUser, User};

    use super::*;

    fn user(username: &str, email: &str) -> User {
        User::create(
            NewUser {
                username: username.to_string(),
                name: username.to_string(),
                email: email.to_string(),
                password_hash: String::new(),
                company_id: None,
                is_admin: false,
                email_verified: false,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_duplicate_key_and_unique_fields_even_when_trashed() {
        let store = InMemoryModelStore::<User>::new();
        let mut ada = user("ada", "ada@example.com");
        ada.deleted_at = Some(Utc::now());
        store.insert(ada).unwrap();

        assert_eq!(
            store.insert(user("ada", "other@example.com")).unwrap_err(),
            StoreError::Duplicate {
                field: "key",
                value: "ada".to_string()
            }
        );
        assert!(matches!(
            store.insert(user("bob", "ada@example.com")),
            Err(StoreError::Duplicate { field: "email", .. })
        ));
    }

    #[test]
    fn trashed_scopes_filter_lookups_and_lists() {
        let store = InMemoryModelStore::<User>::new();
        store.insert(user("bob", "bob@example.com")).unwrap();
        let mut ada = user("ada", "ada@example.com");
        ada.deleted_at = Some(Utc::now());
        store.insert(ada).unwrap();

        assert!(store.find_by_key("ada", Trashed::Without).unwrap().is_none());
        assert!(store.find_by_key("ada", Trashed::With).unwrap().is_some());
        assert!(
            store
                .find_by_unique("email", "ada@example.com", Trashed::Only)
                .unwrap()
                .is_some()
        );

        let keys = |t| {
            store
                .list(t)
                .unwrap()
                .into_iter()
                .map(|u| u.username)
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(Trashed::With), vec!["ada", "bob"]);
        assert_eq!(keys(Trashed::Without), vec!["bob"]);
        assert_eq!(keys(Trashed::Only), vec!["ada"]);
    }

    #[test]
    fn modify_checks_the_current_scope_under_the_lock() {
        let store = InMemoryModelStore::<User>::new();
        let ada = store.insert(user("ada", "ada@example.com")).unwrap();
        let trash = |u: &mut User| u.deleted_at = Some(Utc::now());

        let trashed = store.modify(&ada.id, Trashed::Without, &mut |u| trash(u)).unwrap();
        assert!(trashed.deleted_at.is_some());

        assert_eq!(
            store.modify(&ada.id, Trashed::Without, &mut |u| trash(u)).unwrap_err(),
            StoreError::Stale
        );

        let live = store.modify(&ada.id, Trashed::Only, &mut |u| u.deleted_at = None).unwrap();
        assert!(live.deleted_at.is_none());
        assert!(store.get(&ada.id).unwrap().unwrap().deleted_at.is_none());

        let other = user("bob", "bob@example.com");
        assert_eq!(
            store.modify(&other.id, Trashed::With, &mut |_| {}).unwrap_err(),
            StoreError::Missing
        );
    }

    #[test]
    fn save_requires_existing_row() {
        let store = InMemoryModelStore::<User>::new();
        assert_eq!(
            store.save(user("ada", "ada@example.com")).unwrap_err(),
            StoreError::Missing
        );
    }
}
