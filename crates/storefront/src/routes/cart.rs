//! Cart route handlers.
//!
//! Every browser session is bound to one in-memory [`CartSession`] through
//! the `cart_session` key. Mutations apply locally and return the updated
//! view immediately; persistence happens on the session's debounce timer.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use stride_core::{CartLineItem, CartSessionId, NewCartItem, Price, ProductId, Size, SizeSystem};

use crate::cart::{CartSession, SyncPhase};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// One cart line as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItemView {
    pub product_id: String,
    pub name: String,
    pub price_display: String,
    pub image_url: String,
    pub size: Size,
    pub size_system: SizeSystem,
    pub quantity: u32,
    /// `None` when the line's price cannot be parsed.
    pub line_price: Option<String>,
}

impl From<&CartLineItem> for CartItemView {
    fn from(line: &CartLineItem) -> Self {
        Self {
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            price_display: line.price_display.clone(),
            image_url: line.image_url.clone(),
            size: line.size.clone(),
            size_system: line.size_system,
            quantity: line.quantity.get(),
            line_price: line.line_price().ok().map(|p| p.display()),
        }
    }
}

/// Cart state as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total_items: u64,
    /// `None` when the lines cannot be totaled (malformed or mixed currencies).
    pub subtotal: Option<String>,
    pub phase: SyncPhase,
    pub pending_sync: bool,
}

impl CartView {
    pub(crate) fn from_session(cart: &CartSession) -> Self {
        let (items, total_items, subtotal) = cart.with_cart(|local| {
            (
                local.items().iter().map(CartItemView::from).collect(),
                local.total_items(),
                local.total_price(),
            )
        });

        let subtotal = match subtotal {
            Ok(price) => Some(price.display()),
            Err(e) => {
                warn!(error = %e, "cart subtotal unavailable");
                None
            }
        };

        Self {
            items,
            total_items,
            subtotal,
            phase: cart.phase(),
            pending_sync: cart.has_pending_write(),
        }
    }
}

/// Cart badge count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartCount {
    pub count: u64,
}

// =============================================================================
// Requests
// =============================================================================

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub name: String,
    pub price_display: String,
    #[serde(default)]
    pub image_url: String,
    pub size: Size,
    #[serde(default)]
    pub size_system: SizeSystem,
}

impl AddItemRequest {
    fn into_item(self) -> Result<NewCartItem> {
        if self.product_id.trim().is_empty() {
            return Err(AppError::BadRequest("product_id is required".to_string()));
        }
        Price::parse_display(&self.price_display).map_err(|e| {
            AppError::BadRequest(format!("invalid price_display '{}': {e}", self.price_display))
        })?;

        Ok(NewCartItem {
            product_id: ProductId::new(self.product_id),
            name: self.name,
            price_display: self.price_display,
            image_url: self.image_url,
            size: self.size,
            size_system: self.size_system,
        })
    }
}

/// Set-quantity request. A quantity of zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub size: Size,
    pub quantity: i64,
}

/// Remove-line request.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: String,
    pub size: Size,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart session ID for this browser session, creating one if needed.
pub(crate) async fn cart_session_id(session: &Session) -> Result<CartSessionId> {
    if let Some(id) = session
        .get::<CartSessionId>(session_keys::CART_SESSION)
        .await?
    {
        return Ok(id);
    }

    let id = CartSessionId::generate();
    session.insert(session_keys::CART_SESSION, id).await?;
    Ok(id)
}

/// Resolve the [`CartSession`] bound to this browser session.
pub(crate) async fn cart_session(
    state: &AppState,
    session: &Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<CartSession> {
    let id = cart_session_id(session).await?;
    Ok(state
        .carts()
        .get_or_mount(id, user.map(|u| u.id))
        .await)
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the cart.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = cart_session(&state, &session, auth).await?;
    Ok(Json(CartView::from_session(&cart)))
}

/// Cart badge count.
#[instrument(skip(state, session, auth))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<CartCount>> {
    let cart = cart_session(&state, &session, auth).await?;
    Ok(Json(CartCount {
        count: cart.total_items(),
    }))
}

/// Add one unit of an item.
#[instrument(skip(state, session, auth, request), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let item = request.into_item()?;
    let cart = cart_session(&state, &session, auth).await?;

    add_breadcrumb("cart", &format!("Added {} to cart", item.product_id));
    cart.add_item(item);

    Ok(Json(CartView::from_session(&cart)))
}

/// Set a line's quantity.
#[instrument(skip(state, session, auth, request), fields(product_id = %request.product_id, quantity = request.quantity))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let cart = cart_session(&state, &session, auth).await?;
    cart.update_quantity(
        &ProductId::new(request.product_id),
        &request.size,
        request.quantity,
    );
    Ok(Json(CartView::from_session(&cart)))
}

/// Remove a line.
#[instrument(skip(state, session, auth, request), fields(product_id = %request.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Json(request): Json<RemoveItemRequest>,
) -> Result<Json<CartView>> {
    let cart = cart_session(&state, &session, auth).await?;
    cart.remove_item(&ProductId::new(request.product_id), &request.size);
    Ok(Json(CartView::from_session(&cart)))
}

/// Empty the cart, locally and remotely.
#[instrument(skip(state, session, auth))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = cart_session(&state, &session, auth).await?;
    add_breadcrumb("cart", "Cleared cart");
    cart.clear();
    Ok(Json(CartView::from_session(&cart)))
}
