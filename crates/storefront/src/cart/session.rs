//! Cart sync coordinator.
//!
//! A [`CartSession`] owns one session's [`LocalCart`] and mirrors it to a
//! [`RemoteCartStore`]:
//!
//! ```text
//! Uninitialized ──mount──▶ Loading ──load done──▶ Ready
//!                                                  │  ▲
//!                                          sign-in │  │ load done
//!                                                  ▼  │
//!                                               Reloading
//! ```
//!
//! - Local mutations apply immediately and never wait on the network.
//! - Once `Ready` with a signed-in user, each mutation restarts a debounce
//!   timer; when it fires the latest snapshot is upserted. A burst of
//!   mutations becomes one write.
//! - Writes are suppressed while loading so an empty local cart cannot
//!   overwrite a populated remote snapshot.
//! - Sign-in replaces the local cart with the remote snapshot. Guest lines
//!   are discarded, not merged.
//! - Sign-out empties the local cart and leaves the remote snapshot alone.
//! - `clear` deletes the remote snapshot, even while a load is in flight,
//!   and discards that load.
//!
//! Remote failures are logged and swallowed. A failed load yields an empty
//! cart, a failed write is retried by the next mutation's debounce cycle.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use stride_core::{
    AddOutcome, CartLineItem, CartSnapshot, LocalCart, NewCartItem, Price, PriceError, ProductId,
    Size, UserId,
};

use super::events::CartEvent;
use super::remote::{RemoteCartError, RemoteCartStore};
use crate::auth::{AuthEvent, AuthProvider};

/// Default quiet period before a burst of mutations is written remotely.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

const EVENT_CAPACITY: usize = 64;

/// Where a session is in its load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Created, not yet mounted.
    Uninitialized,
    /// First remote load in progress.
    Loading,
    /// Remote load triggered by a sign-in while already `Ready`.
    Reloading,
    /// Local cart is authoritative; writes flow to the remote store.
    Ready,
}

impl SyncPhase {
    /// Whether a remote load is in flight.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading | Self::Reloading)
    }
}

/// Local cart plus its sync state for one client session.
///
/// Cheap to clone; clones share the same session. Mutations must be called
/// from within a tokio runtime because they schedule the debounced write.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn RemoteCartStore>,
    debounce: Duration,
    state: Mutex<SessionState>,
    events: broadcast::Sender<CartEvent>,
}

struct SessionState {
    cart: LocalCart,
    phase: SyncPhase,
    user: Option<UserId>,
    // Bumped by every auth transition and by a clear during a load; a load
    // finishing under an older generation is dropped.
    load_generation: u64,
    // Bumped whenever the pending write is replaced or cancelled; a timer
    // that wakes under an older sequence does nothing.
    write_seq: u64,
    // Only set while the timer is sleeping. Cleared once the write is in
    // flight so it can no longer be aborted.
    pending_write: Option<JoinHandle<()>>,
}

impl SessionState {
    fn cancel_pending_write(&mut self) {
        self.write_seq = self.write_seq.wrapping_add(1);
        if let Some(handle) = self.pending_write.take() {
            handle.abort();
        }
    }

    fn writable_user(&self) -> Option<UserId> {
        if self.phase == SyncPhase::Ready {
            self.user
        } else {
            None
        }
    }
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CartSession")
            .field("phase", &state.phase)
            .field("user", &state.user)
            .field("lines", &state.cart.len())
            .field("write_pending", &state.pending_write.is_some())
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Create an unmounted session writing to `remote`.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteCartStore>, debounce: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                remote,
                debounce,
                state: Mutex::new(SessionState {
                    cart: LocalCart::new(),
                    phase: SyncPhase::Uninitialized,
                    user: None,
                    load_generation: 0,
                    write_seq: 0,
                    pending_write: None,
                }),
                events,
            }),
        }
    }

    /// Subscribe to [`CartEvent`]s.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CartEvent> {
        self.inner.events.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.inner.state.lock().phase
    }

    /// The signed-in user this session syncs for.
    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.inner.state.lock().user
    }

    /// Whether a debounced write is waiting for its timer.
    #[must_use]
    pub fn has_pending_write(&self) -> bool {
        self.inner.state.lock().pending_write.is_some()
    }

    /// Copy of the current lines.
    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.inner.state.lock().cart.items().to_vec()
    }

    /// Run `f` against the local cart without cloning it.
    pub fn with_cart<R>(&self, f: impl FnOnce(&LocalCart) -> R) -> R {
        f(&self.inner.state.lock().cart)
    }

    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.inner.state.lock().cart.total_items()
    }

    /// See [`LocalCart::total_price`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if any line's price cannot be parsed.
    pub fn total_price(&self) -> Result<Price, PriceError> {
        self.inner.state.lock().cart.total_price()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.lock().cart.snapshot()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the session.
    ///
    /// A signed-in user's remote snapshot is loaded before the session
    /// becomes `Ready`; a guest session is `Ready` immediately.
    pub async fn mount(&self, user: Option<UserId>) {
        match user {
            Some(user_id) => self.load(user_id, SyncPhase::Loading).await,
            None => {
                let mut state = self.inner.state.lock();
                state.phase = SyncPhase::Ready;
            }
        }
    }

    /// Switch the session to `user_id` and replace the local cart with
    /// their remote snapshot.
    pub async fn sign_in(&self, user_id: UserId) {
        let phase = if self.phase() == SyncPhase::Ready {
            SyncPhase::Reloading
        } else {
            SyncPhase::Loading
        };
        self.load(user_id, phase).await;
    }

    /// Drop the user and empty the local cart. The remote snapshot is kept
    /// for their next sign-in.
    pub fn sign_out(&self) {
        let previous = {
            let mut state = self.inner.state.lock();
            state.cancel_pending_write();
            state.load_generation = state.load_generation.wrapping_add(1);
            state.cart.clear();
            state.phase = SyncPhase::Ready;
            state.user.take()
        };
        if let Some(user_id) = previous {
            info!(user_id = %user_id, "cart session signed out");
        }
        self.emit(CartEvent::Cleared);
        self.emit(CartEvent::Changed { total_items: 0 });
    }

    /// Apply an auth transition.
    pub async fn handle_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user_id) => self.sign_in(user_id).await,
            AuthEvent::SignedOut => self.sign_out(),
        }
    }

    /// Mount with `provider`'s current user, then follow its transitions.
    ///
    /// The returned task ends when the provider is dropped or every handle
    /// to this session has been dropped.
    pub async fn attach(&self, provider: Arc<dyn AuthProvider>) -> JoinHandle<()> {
        // Subscribe first so a transition racing the initial query is not lost.
        let mut events = provider.subscribe();
        let user = current_user_or_guest(provider.as_ref()).await;
        self.mount(user).await;

        let session = Arc::downgrade(&self.inner);
        let provider = Arc::downgrade(&provider);
        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed auth events, resyncing from provider");
                        let Some(provider) = provider.upgrade() else {
                            break;
                        };
                        match current_user_or_guest(provider.as_ref()).await {
                            Some(user_id) => AuthEvent::SignedIn(user_id),
                            None => AuthEvent::SignedOut,
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Some(inner) = session.upgrade() else {
                    break;
                };
                Self { inner }.handle_auth_event(event).await;
            }
        })
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn load(&self, user_id: UserId, phase: SyncPhase) {
        let generation = {
            let mut state = self.inner.state.lock();
            state.cancel_pending_write();
            state.load_generation = state.load_generation.wrapping_add(1);
            state.user = Some(user_id);
            state.phase = phase;
            state.load_generation
        };

        let items = match self.inner.remote.get(user_id).await {
            Ok(Some(snapshot)) => snapshot.items,
            Ok(None) | Err(RemoteCartError::NotFound) => {
                debug!("no remote cart, starting empty");
                Vec::new()
            }
            Err(RemoteCartError::Malformed(e)) => {
                warn!(error = %e, "remote cart is malformed, starting empty");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "failed to load remote cart, starting empty");
                Vec::new()
            }
        };

        let (lines, total_items) = {
            let mut state = self.inner.state.lock();
            if state.load_generation != generation {
                debug!("session changed during load, discarding result");
                return;
            }
            state.cart.replace(items);
            state.phase = SyncPhase::Ready;
            (state.cart.len(), state.cart.total_items())
        };

        info!(lines, "cart loaded");
        self.emit(CartEvent::Loaded {
            user_id,
            items: lines,
        });
        self.emit(CartEvent::Changed { total_items });
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `item`; see [`LocalCart::add_item`].
    ///
    /// Emits exactly one [`CartEvent::ItemAdded`].
    pub fn add_item(&self, item: NewCartItem) -> AddOutcome {
        let product_id = item.product_id.clone();
        let size = item.size.clone();

        let (outcome, total_items) = {
            let mut state = self.inner.state.lock();
            let outcome = state.cart.add_item(item);
            self.schedule_write(&mut state);
            (outcome, state.cart.total_items())
        };

        self.emit(CartEvent::ItemAdded { product_id, size });
        self.emit(CartEvent::Changed { total_items });
        outcome
    }

    /// Remove the line for `(product_id, size)`. No-op if absent.
    pub fn remove_item(&self, product_id: &ProductId, size: &Size) {
        self.mutate(|cart| cart.remove_item(product_id, size));
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update_quantity(&self, product_id: &ProductId, size: &Size, quantity: i64) {
        self.mutate(|cart| cart.update_quantity(product_id, size, quantity));
    }

    /// Empty the cart and delete the user's remote snapshot.
    ///
    /// Safe to call repeatedly. The delete runs in the background. A load
    /// still in flight is discarded so it cannot restore the cleared lines.
    pub fn clear(&self) {
        let user = {
            let mut state = self.inner.state.lock();
            state.cart.clear();
            state.cancel_pending_write();
            if state.phase.is_loading() {
                state.load_generation = state.load_generation.wrapping_add(1);
                state.phase = SyncPhase::Ready;
            }
            state.user
        };

        self.emit(CartEvent::Cleared);
        self.emit(CartEvent::Changed { total_items: 0 });

        if let Some(user_id) = user {
            let remote = Arc::clone(&self.inner.remote);
            tokio::spawn(async move {
                match remote.delete(user_id).await {
                    Ok(()) => debug!(user_id = %user_id, "remote cart deleted"),
                    Err(RemoteCartError::NotFound) => {
                        debug!(user_id = %user_id, "remote cart already absent");
                    }
                    Err(e) => warn!(user_id = %user_id, error = %e, "failed to delete remote cart"),
                }
            });
        }
    }

    fn mutate(&self, f: impl FnOnce(&mut LocalCart) -> bool) {
        let total_items = {
            let mut state = self.inner.state.lock();
            if !f(&mut state.cart) {
                return;
            }
            self.schedule_write(&mut state);
            state.cart.total_items()
        };
        self.emit(CartEvent::Changed { total_items });
    }

    // =========================================================================
    // Debounced writes
    // =========================================================================

    fn schedule_write(&self, state: &mut SessionState) {
        let Some(user_id) = state.writable_user() else {
            return;
        };

        state.cancel_pending_write();
        let seq = state.write_seq;
        let debounce = self.inner.debounce;
        let session = Arc::downgrade(&self.inner);

        state.pending_write = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            flush(&session, user_id, seq).await;
        }));
    }

    fn emit(&self, event: CartEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

async fn flush(session: &Weak<Inner>, user_id: UserId, seq: u64) {
    // A dropped session abandons its pending write.
    let Some(inner) = session.upgrade() else {
        return;
    };

    let snapshot = {
        let mut state = inner.state.lock();
        if state.write_seq != seq || state.writable_user() != Some(user_id) {
            return;
        }
        state.pending_write = None;
        state.cart.snapshot()
    };

    let lines = snapshot.items.len();
    match inner.remote.upsert(user_id, &snapshot).await {
        Ok(()) => {
            debug!(user_id = %user_id, lines, "cart synced");
            let _ = inner.events.send(CartEvent::Synced {
                user_id,
                items: lines,
            });
        }
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "cart sync failed, will retry on next change");
            let _ = inner.events.send(CartEvent::SyncFailed { user_id });
        }
    }
}

async fn current_user_or_guest(provider: &dyn AuthProvider) -> Option<UserId> {
    match provider.current_user().await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "auth provider unavailable, mounting as guest");
            None
        }
    }
}
