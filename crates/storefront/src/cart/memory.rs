//! In-process remote store for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use stride_core::{CartSnapshot, UserId};

use super::remote::{RemoteCartError, RemoteCartStore};

/// [`RemoteCartStore`] backed by a `HashMap`.
///
/// Snapshots live only as long as the process. Plugged in through
/// `AppState::with_remote` by the test suites; the server binary always
/// persists to `PostgreSQL`.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: Mutex<HashMap<UserId, CartSnapshot>>,
}

impl MemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a snapshot for `user_id`.
    pub fn insert(&self, user_id: UserId, snapshot: CartSnapshot) {
        self.carts.lock().insert(user_id, snapshot);
    }

    /// Read a snapshot without going through the async trait.
    #[must_use]
    pub fn snapshot(&self, user_id: UserId) -> Option<CartSnapshot> {
        self.carts.lock().get(&user_id).cloned()
    }

    /// Number of users with a stored snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.carts.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carts.lock().is_empty()
    }
}

#[async_trait]
impl RemoteCartStore for MemoryCartStore {
    async fn get(&self, user_id: UserId) -> Result<Option<CartSnapshot>, RemoteCartError> {
        Ok(self.snapshot(user_id))
    }

    async fn upsert(
        &self,
        user_id: UserId,
        snapshot: &CartSnapshot,
    ) -> Result<(), RemoteCartError> {
        self.carts.lock().insert(user_id, snapshot.clone());
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<(), RemoteCartError> {
        self.carts
            .lock()
            .remove(&user_id)
            .map(|_| ())
            .ok_or(RemoteCartError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = MemoryCartStore::new();
        let user = UserId::generate();

        store.upsert(user, &CartSnapshot::empty()).await.unwrap();
        let second = CartSnapshot::empty();
        store.upsert(user, &second).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(user).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryCartStore::new();
        assert!(matches!(
            store.delete(UserId::generate()).await,
            Err(RemoteCartError::NotFound)
        ));
    }
}
