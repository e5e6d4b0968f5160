//! Notifications published by a cart session.

use stride_core::{ProductId, Size, UserId};

/// Something observable happened to a cart session.
///
/// Delivered over a `tokio::sync::broadcast` channel; slow subscribers may
/// miss events, so treat these as UI hints rather than a log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// `add_item` was called. Fires once per call, merge or append.
    ItemAdded { product_id: ProductId, size: Size },
    /// The local cart changed.
    Changed { total_items: u64 },
    /// The local cart was emptied by `clear` or sign-out.
    Cleared,
    /// The local cart was replaced with the user's remote snapshot.
    Loaded { user_id: UserId, items: usize },
    /// A debounced write reached the remote store.
    Synced { user_id: UserId, items: usize },
    /// A debounced write failed; the next change retries.
    SyncFailed { user_id: UserId },
}
