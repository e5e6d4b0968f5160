//! Remote cart persistence contract.

use async_trait::async_trait;
use thiserror::Error;

use stride_core::{CartSnapshot, UserId};

/// Errors returned by a [`RemoteCartStore`].
///
/// None of these are fatal to a cart session: the sync coordinator logs
/// them and keeps the local cart as the source of truth.
#[derive(Debug, Error)]
pub enum RemoteCartError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The stored snapshot is not a list of cart lines.
    #[error("malformed cart snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// No snapshot exists for the user.
    #[error("cart not found")]
    NotFound,

    /// The backend could not be reached.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

/// One persisted cart snapshot per user, last write wins.
///
/// Implementations must treat `upsert` as insert-or-replace keyed by user.
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// Fetch the user's snapshot, or `None` if they have never saved one.
    async fn get(&self, user_id: UserId) -> Result<Option<CartSnapshot>, RemoteCartError>;

    /// Replace the user's snapshot.
    async fn upsert(&self, user_id: UserId, snapshot: &CartSnapshot)
    -> Result<(), RemoteCartError>;

    /// Delete the user's snapshot.
    async fn delete(&self, user_id: UserId) -> Result<(), RemoteCartError>;
}
