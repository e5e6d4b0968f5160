//! Persisted cart inspection.
//!
//! # Usage
//!
//! ```bash
//! # Print a user's stored cart as JSON
//! stride-cli cart show --user 6f1c...
//!
//! # Delete a user's stored cart
//! stride-cli cart clear --user 6f1c...
//!
//! # List the most recently updated carts
//! stride-cli cart recent --limit 20
//! ```

use stride_core::UserId;
use stride_storefront::cart::{RemoteCartError, RemoteCartStore};
use stride_storefront::db::PgCartRepository;

use super::{CommandError, connect};

/// Print the user's persisted snapshot.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the stored row
/// cannot be decoded.
pub async fn show(user_id: UserId) -> Result<(), CommandError> {
    let repo = PgCartRepository::new(connect().await?);

    match repo.get(user_id).await? {
        Some(snapshot) => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            #[allow(clippy::print_stdout)]
            {
                println!("{json}");
            }
        }
        None => tracing::info!(%user_id, "No stored cart"),
    }
    Ok(())
}

/// Delete the user's persisted snapshot.
///
/// A missing row is reported, not treated as a failure.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn clear(user_id: UserId) -> Result<(), CommandError> {
    let repo = PgCartRepository::new(connect().await?);

    match repo.delete(user_id).await {
        Ok(()) => tracing::info!(%user_id, "Stored cart deleted"),
        Err(RemoteCartError::NotFound) => tracing::info!(%user_id, "No stored cart"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// List the most recently updated carts.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn recent(limit: u32) -> Result<(), CommandError> {
    let repo = PgCartRepository::new(connect().await?);

    let carts = repo.recent(limit).await?;
    #[allow(clippy::print_stdout)]
    {
        for (user_id, updated_at) in carts {
            println!("{user_id}  {}", updated_at.to_rfc3339());
        }
    }
    Ok(())
}
