//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cart::{CartRegistry, RemoteCartStore};
use crate::config::StorefrontConfig;
use crate::db::PgCartRepository;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    carts: CartRegistry,
}

impl AppState {
    /// Create application state that persists carts in `PostgreSQL`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let remote = Arc::new(PgCartRepository::new(pool.clone()));
        Self::with_remote(config, pool, remote)
    }

    /// Create application state with a custom remote cart store.
    ///
    /// `pool` is still used for health checks and the session store.
    #[must_use]
    pub fn with_remote(
        config: StorefrontConfig,
        pool: PgPool,
        remote: Arc<dyn RemoteCartStore>,
    ) -> Self {
        let carts = CartRegistry::new(
            remote,
            config.cart.debounce,
            config.cart.session_capacity,
            config.cart.session_idle,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the live cart sessions.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }
}
