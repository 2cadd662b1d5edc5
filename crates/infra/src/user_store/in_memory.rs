use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use userhub_core::{Entity, User, UserId};

use super::r#trait::{StoreError, UserStore};

#[derive(Debug)]
struct State {
    users: BTreeMap<UserId, User>,
    next_id: UserId,
    failure: Option<StoreError>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            next_id: 1,
            failure: None,
        }
    }
}

impl State {
    fn check_failure(&self) -> Result<(), StoreError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// In-memory user store.
///
/// Intended for tests/dev. Every operation, reads included, runs under one
/// mutex, so access is fully serialized. Ids come from a counter starting at 1
/// that only moves forward; deleted ids are never handed out again.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    state: Mutex<State>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::internal(operation, "lock poisoned"))
    }

    /// Drop all records, rewind the id counter to 1 and clear any injected failure.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        *state = State::default();
    }

    /// Insert a record directly, bypassing the email check.
    ///
    /// A record with `id == 0` gets the next counter value. An explicit id
    /// pushes the counter past it so later creates cannot collide.
    pub fn seed(&self, mut user: User) -> User {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if !user.is_saved() {
            user.id = state.next_id;
            state.next_id += 1;
        } else if user.id >= state.next_id {
            state.next_id = user.id.saturating_add(1);
        }
        state.users.insert(user.id, user.clone());
        user
    }

    /// Make every subsequent operation fail with `err` until cleared or reset.
    pub fn fail_with(&self, err: StoreError) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.failure = Some(err);
    }

    pub fn clear_failure(&self) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.failure = None;
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: &User) -> Result<UserId, StoreError> {
        let mut state = self.lock("create_user")?;
        state.check_failure()?;

        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(user.email.clone()));
        }

        let id = state.next_id;
        state.next_id += 1;
        state.users.insert(id, user.with_id(id));
        Ok(id)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let state = self.lock("get_user_by_id")?;
        state.check_failure()?;

        state.users.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn get_all_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.lock("get_all_users")?;
        state.check_failure()?;

        Ok(state.users.values().cloned().collect())
    }

    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.lock("update_user")?;
        state.check_failure()?;

        // Unknown id wins over a duplicate email, matching the single UPDATE in Postgres.
        if !state.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(user.id));
        }
        if state.email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::Conflict(user.email.clone()));
        }

        match state.users.get_mut(&user.id) {
            Some(existing) => {
                existing.name = user.name.clone();
                existing.email = user.email.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(user.id)),
        }
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut state = self.lock("delete_user")?;
        state.check_failure()?;

        state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::user_store::StoreErrorKind;

    fn alice() -> User {
        User::new("Alice", "alice@example.com")
    }

    fn bob() -> User {
        User::new("Bob", "bob@example.com")
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_roundtrips() {
        let store = InMemoryUserStore::new();

        let a = store.create_user(&alice()).await.unwrap();
        let b = store.create_user(&bob()).await.unwrap();
        assert_eq!((a, b), (1, 2));

        let fetched = store.get_user_by_id(a).await.unwrap();
        assert_eq!(fetched, alice().with_id(a));
    }

    #[tokio::test]
    async fn create_ignores_payload_id() {
        let store = InMemoryUserStore::new();
        let id = store.create_user(&alice().with_id(99)).await.unwrap();
        assert_eq!(id, 1);
        assert!(store.get_user_by_id(99).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_email_on_create_is_conflict() {
        let store = InMemoryUserStore::new();
        store.create_user(&alice()).await.unwrap();

        let err = store
            .create_user(&User::new("Other", "alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Conflict);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_all_is_empty_vec_then_ordered_by_id() {
        let store = InMemoryUserStore::new();
        assert!(store.get_all_users().await.unwrap().is_empty());

        store.seed(bob().with_id(5));
        store.seed(alice().with_id(2));
        store.create_user(&User::new("Carol", "carol@example.com")).await.unwrap();

        let ids: Vec<_> = store
            .get_all_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .collect();
        assert_eq!(ids, vec![2, 5, 6]);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = InMemoryUserStore::new();

        assert_eq!(store.get_user_by_id(42).await.unwrap_err(), StoreError::NotFound(42));
        assert_eq!(
            store.update_user(&alice().with_id(42)).await.unwrap_err(),
            StoreError::NotFound(42)
        );
        assert_eq!(store.delete_user(42).await.unwrap_err(), StoreError::NotFound(42));
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found_even_with_taken_email() {
        let store = InMemoryUserStore::new();
        store.seed(User::new("Alice", "a@x.com"));

        let err = store
            .update_user(&User::new("Ghost", "a@x.com").with_id(999))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn seeding_max_id_does_not_overflow() {
        let store = InMemoryUserStore::new();
        let seeded = store.seed(alice().with_id(i64::MAX));
        assert_eq!(seeded.id, i64::MAX);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_checks_email_owner() {
        let store = InMemoryUserStore::new();
        let a = store.create_user(&alice()).await.unwrap();
        let b = store.create_user(&bob()).await.unwrap();

        // Keeping your own email is fine.
        store
            .update_user(&User::new("Alice2", "alice@example.com").with_id(a))
            .await
            .unwrap();
        assert_eq!(store.get_user_by_id(a).await.unwrap().name, "Alice2");

        let err = store
            .update_user(&User::new("Bob", "alice@example.com").with_id(b))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Conflict);
        assert_eq!(store.get_user_by_id(b).await.unwrap().email, "bob@example.com");
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found_and_id_not_reused() {
        let store = InMemoryUserStore::new();
        let a = store.create_user(&alice()).await.unwrap();
        store.delete_user(a).await.unwrap();

        assert_eq!(store.get_user_by_id(a).await.unwrap_err().kind(), StoreErrorKind::NotFound);

        let next = store.create_user(&alice()).await.unwrap();
        assert_ne!(next, a);
    }

    #[tokio::test]
    async fn returned_records_are_copies() {
        let store = InMemoryUserStore::new();
        let id = store.create_user(&alice()).await.unwrap();

        let mut fetched = store.get_user_by_id(id).await.unwrap();
        fetched.name = "Mallory".into();

        let mut listed = store.get_all_users().await.unwrap();
        listed[0].email = "mallory@example.com".into();

        assert_eq!(store.get_user_by_id(id).await.unwrap(), alice().with_id(id));
    }

    #[tokio::test]
    async fn seed_assigns_or_bumps_counter() {
        let store = InMemoryUserStore::new();

        let seeded = store.seed(alice());
        assert_eq!(seeded.id, 1);

        store.seed(bob().with_id(10));
        let id = store.create_user(&User::new("Carol", "carol@example.com")).await.unwrap();
        assert_eq!(id, 11);

        // A lower explicit id does not rewind the counter.
        store.seed(User::new("Dan", "dan@example.com").with_id(3));
        let id = store.create_user(&User::new("Eve", "eve@example.com")).await.unwrap();
        assert_eq!(id, 12);
    }

    #[tokio::test]
    async fn injected_failure_hits_every_operation() {
        let store = InMemoryUserStore::new();
        let id = store.create_user(&alice()).await.unwrap();
        store.fail_with(StoreError::internal("test", "simulated outage"));

        assert_eq!(store.create_user(&bob()).await.unwrap_err().kind(), StoreErrorKind::Internal);
        assert_eq!(store.get_user_by_id(id).await.unwrap_err().kind(), StoreErrorKind::Internal);
        assert_eq!(store.get_all_users().await.unwrap_err().kind(), StoreErrorKind::Internal);
        assert_eq!(
            store.update_user(&alice().with_id(id)).await.unwrap_err().kind(),
            StoreErrorKind::Internal
        );
        assert_eq!(store.delete_user(id).await.unwrap_err().kind(), StoreErrorKind::Internal);

        store.clear_failure();
        assert!(store.get_user_by_id(id).await.is_ok());
    }

    #[tokio::test]
    async fn reset_clears_records_counter_and_failure() {
        let store = InMemoryUserStore::new();
        store.create_user(&alice()).await.unwrap();
        store.fail_with(StoreError::internal("test", "boom"));

        store.reset();

        assert!(store.is_empty());
        assert_eq!(store.create_user(&bob()).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(InMemoryUserStore::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_user(&User::new(format!("user{i}"), format!("user{i}@example.com")))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for h in handles {
            assert!(ids.insert(h.await.unwrap()));
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(store.len(), 64);
    }

    proptest! {
        /// Property: ids handed out by create are non-zero and never repeat,
        /// whatever interleaving of creates and deletes happens.
        #[test]
        fn assigned_ids_are_unique(ops in prop::collection::vec(any::<bool>(), 1..50)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let store = InMemoryUserStore::new();
                let mut seen = HashSet::new();
                for (n, create) in ops.into_iter().enumerate() {
                    if create || seen.is_empty() {
                        let id = store
                            .create_user(&User::new("u", format!("u{n}@example.com")))
                            .await
                            .unwrap();
                        prop_assert!(id != 0);
                        prop_assert!(seen.insert(id));
                    } else if let Some(id) = seen.iter().copied().max() {
                        let _ = store.delete_user(id).await;
                    }
                }
                Ok(())
            })?;
        }
    }
}
