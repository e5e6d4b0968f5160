//! Auth provider contract consumed by cart sessions.
//!
//! Credential checks live with the hosted auth platform. The storefront
//! only needs two things from it: who is signed in right now, and a stream
//! of sign-in/sign-out transitions.

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;

use stride_core::UserId;

const AUTH_EVENT_CAPACITY: usize = 16;

/// A sign-in or sign-out transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(UserId),
    SignedOut,
}

/// Errors from an [`AuthProvider`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider could not be reached.
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Source of the current user and of auth transitions.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in user, if any.
    async fn current_user(&self) -> Result<Option<UserId>, AuthError>;

    /// Subscribe to future transitions.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// In-process [`AuthProvider`] driven by explicit `sign_in`/`sign_out` calls.
#[derive(Debug)]
pub struct ChannelAuthProvider {
    current: RwLock<Option<UserId>>,
    events: broadcast::Sender<AuthEvent>,
}

impl ChannelAuthProvider {
    /// A provider with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            current: RwLock::new(None),
            events,
        }
    }

    /// A provider with `user_id` already signed in.
    #[must_use]
    pub fn signed_in(user_id: UserId) -> Self {
        let provider = Self::new();
        *provider.current.write() = Some(user_id);
        provider
    }

    /// Record a sign-in and notify subscribers.
    pub fn sign_in(&self, user_id: UserId) {
        *self.current.write() = Some(user_id);
        let _ = self.events.send(AuthEvent::SignedIn(user_id));
    }

    /// Record a sign-out and notify subscribers.
    pub fn sign_out(&self) {
        *self.current.write() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }
}

impl Default for ChannelAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for ChannelAuthProvider {
    async fn current_user(&self) -> Result<Option<UserId>, AuthError> {
        Ok(*self.current.read())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transitions_update_current_user_and_notify() {
        let provider = ChannelAuthProvider::new();
        let mut events = provider.subscribe();
        let user = UserId::generate();

        assert_eq!(provider.current_user().await.unwrap(), None);

        provider.sign_in(user);
        assert_eq!(provider.current_user().await.unwrap(), Some(user));
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn(user));

        provider.sign_out();
        assert_eq!(provider.current_user().await.unwrap(), None);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
    }
}
