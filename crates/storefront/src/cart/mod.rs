//! Cart synchronization.
//!
//! # Architecture
//!
//! - [`LocalCart`](stride_core::LocalCart) (core crate) holds the lines
//! - [`CartSession`] wraps it with the sync state machine and debounce timer
//! - [`RemoteCartStore`] persists one snapshot per user
//!   ([`PgCartRepository`](crate::db::PgCartRepository) in production,
//!   [`MemoryCartStore`] in development and tests)
//! - [`CartRegistry`] keeps one session per browser session in memory
//!
//! # Example
//!
//! ```rust,ignore
//! use stride_storefront::cart::{CartSession, MemoryCartStore, DEFAULT_DEBOUNCE};
//!
//! let session = CartSession::new(Arc::new(MemoryCartStore::new()), DEFAULT_DEBOUNCE);
//! session.mount(Some(user_id)).await;
//! session.add_item(item);
//! // ~250ms later the snapshot is upserted remotely
//! ```

mod events;
mod memory;
mod registry;
mod remote;
mod session;

pub use events::CartEvent;
pub use memory::MemoryCartStore;
pub use registry::CartRegistry;
pub use remote::{RemoteCartError, RemoteCartStore};
pub use session::{CartSession, DEFAULT_DEBOUNCE, SyncPhase};
