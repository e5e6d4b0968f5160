//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "stride_session";

/// Create the session layer with `PostgreSQL` store.
///
/// The browser session outlives a cart session held in memory only as long
/// as `CART_SESSION_IDLE_SECS`, so both share the same inactivity window.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    // The tower_sessions.session table is created by `stride-cli migrate`
    let store = PostgresStore::new(pool.clone());
    session_layer(store, config)
}

/// Apply the storefront's cookie settings to any session store.
pub fn session_layer<S>(store: S, config: &StorefrontConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let idle = i64::try_from(config.cart.session_idle.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(idle)))
        .with_secure(config.secure_cookies())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
