//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)

pub mod auth;
pub mod session;

pub use auth::{
    GATEWAY_SECRET_HEADER, GatewayAuth, OptionalAuth, clear_current_user, set_current_user,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
