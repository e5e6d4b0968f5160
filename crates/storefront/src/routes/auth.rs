//! Sign-in and sign-out routes.
//!
//! Credentials are verified by the auth gateway in front of the storefront;
//! these handlers only record the resulting identity in the browser session
//! and move the bound cart session through the matching transition. Both
//! require the gateway's shared secret.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use stride_core::UserId;

use crate::auth::AuthEvent;
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{GatewayAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::cart::{CartView, cart_session_id};
use crate::state::AppState;

/// Sign-in request from the auth gateway.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user_id: UserId,
}

/// Record a sign-in and load the user's remote cart.
///
/// The guest cart in this browser session is replaced by the user's
/// persisted cart.
#[instrument(skip_all, fields(user_id = %request.user_id))]
pub async fn sign_in(
    _gateway: GatewayAuth,
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<CartView>> {
    let user_id = request.user_id;

    // New identity, new session ID
    session.cycle_id().await?;
    set_current_user(&session, &CurrentUser { id: user_id }).await?;
    set_sentry_user(&user_id);

    let id = cart_session_id(&session).await?;
    let cart = match state.carts().get(id).await {
        Some(cart) => {
            cart.handle_auth_event(AuthEvent::SignedIn(user_id)).await;
            cart
        }
        None => state.carts().get_or_mount(id, Some(user_id)).await,
    };

    info!(total_items = cart.total_items(), "user signed in");
    Ok(Json(CartView::from_session(&cart)))
}

/// Record a sign-out and empty the local cart. The remote cart is kept.
#[instrument(skip_all)]
pub async fn sign_out(
    _gateway: GatewayAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();

    let id = cart_session_id(&session).await?;
    let cart = state.carts().get_or_mount(id, None).await;
    cart.handle_auth_event(AuthEvent::SignedOut).await;

    info!("user signed out");
    Ok(Json(CartView::from_session(&cart)))
}
