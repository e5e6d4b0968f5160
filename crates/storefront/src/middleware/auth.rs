//! Authentication extractors.
//!
//! The user identity in the session is written by the sign-in route; these
//! extractors only read it back. [`GatewayAuth`] guards the routes only the
//! auth gateway may call.

use axum::{extract::FromRequestParts, http::request::Parts};
use secrecy::ExposeSecret;
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Header carrying the auth gateway's shared secret.
pub const GATEWAY_SECRET_HEADER: &str = "x-stride-gateway-secret";

/// Extractor that rejects callers without the gateway's shared secret.
pub struct GatewayAuth;

impl FromRequestParts<AppState> for GatewayAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let provided = parts
            .headers
            .get(GATEWAY_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing gateway secret".to_string()))?;

        if !constant_time_compare(state.config().gateway_secret.expose_secret(), provided) {
            tracing::warn!("rejected auth call with wrong gateway secret");
            return Err(AppError::Unauthorized("invalid gateway secret".to_string()));
        }

        Ok(Self)
    }
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; guests get `None`.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the signed-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("gateway", "gateway"));
        assert!(!constant_time_compare("gateway", "gatewax"));
        assert!(!constant_time_compare("gateway", "gate"));
        assert!(!constant_time_compare("", "gateway"));
    }
}
