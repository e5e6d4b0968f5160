//! Per-browser-session cart registry.
//!
//! Sessions are held in a `moka` cache with an idle timeout. Eviction drops
//! the session, which abandons any write still waiting on its debounce
//! timer.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use stride_core::{CartSessionId, UserId};

use super::remote::RemoteCartStore;
use super::session::CartSession;

/// Live [`CartSession`]s keyed by browser session.
#[derive(Clone)]
pub struct CartRegistry {
    sessions: Cache<CartSessionId, CartSession>,
    remote: Arc<dyn RemoteCartStore>,
    debounce: Duration,
}

impl CartRegistry {
    /// Create a registry holding at most `capacity` sessions, each evicted
    /// after `idle` without access.
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteCartStore>,
        debounce: Duration,
        capacity: u64,
        idle: Duration,
    ) -> Self {
        let sessions = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle)
            .build();

        Self {
            sessions,
            remote,
            debounce,
        }
    }

    /// Get the session for `id`, creating and mounting it for `user` if it
    /// does not exist yet.
    ///
    /// Concurrent callers for the same `id` share a single mount.
    pub async fn get_or_mount(&self, id: CartSessionId, user: Option<UserId>) -> CartSession {
        let remote = Arc::clone(&self.remote);
        let debounce = self.debounce;
        self.sessions
            .get_with(id, async move {
                debug!(cart_session = %id, authenticated = user.is_some(), "mounting cart session");
                let session = CartSession::new(remote, debounce);
                session.mount(user).await;
                session
            })
            .await
    }

    /// Get an existing session.
    pub async fn get(&self, id: CartSessionId) -> Option<CartSession> {
        self.sessions.get(&id).await
    }

    /// Drop a session.
    pub async fn remove(&self, id: CartSessionId) {
        self.sessions.invalidate(&id).await;
    }
}
