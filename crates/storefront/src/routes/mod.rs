//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health          - Liveness check
//! GET    /health/ready    - Readiness check (database)
//!
//! # Cart (JSON)
//! GET    /cart            - Cart view
//! GET    /cart/count      - Cart count badge
//! POST   /cart/items      - Add one unit of an item
//! PATCH  /cart/items      - Set a line's quantity (<= 0 removes)
//! DELETE /cart/items      - Remove a line
//! DELETE /cart            - Clear the cart
//!
//! # Auth (called by the auth gateway)
//! POST   /auth/sign-in    - Record sign-in, load the user's cart
//! POST   /auth/sign-out   - Record sign-out, empty the local cart
//! ```

pub mod auth;
pub mod cart;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::db;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route(
            "/items",
            post(cart::add).patch(cart::update).delete(cart::remove),
        )
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
}

/// Create the health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match db::ping(state.pool()).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
