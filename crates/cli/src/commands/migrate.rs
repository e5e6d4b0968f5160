//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! stride-cli migrate
//! ```
//!
//! Runs the storefront migrations in `crates/storefront/migrations/` and
//! creates the `tower_sessions.session` table used for browser sessions.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, connect};

/// Run storefront database migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
