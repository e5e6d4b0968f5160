//! Session-related types.
//!
//! Types stored in the browser session for authentication and cart state.

use serde::{Deserialize, Serialize};

use stride_core::UserId;

/// Session-stored user identity.
///
/// Set by the auth gateway on sign-in; only the ID is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Auth platform user ID.
    pub id: UserId,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the in-memory cart session bound to this browser session.
    pub const CART_SESSION: &str = "cart_session";
}
