//! JSON API tests against the full router.
//!
//! Uses an in-memory session store and remote cart store; the debounce is
//! short enough to wait out in real time.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use stride_core::{CartSnapshot, UserId};
use stride_integration_tests::{TestApp, line};
use stride_storefront::cart::MemoryCartStore;

fn add_body(product_id: &str, size: Value, price_display: &str) -> Value {
    json!({
        "product_id": product_id,
        "name": "Air Runner",
        "price_display": price_display,
        "image_url": "https://cdn.stride.shop/air-runner.jpg",
        "size": size,
        "size_system": "EU"
    })
}

#[tokio::test]
async fn test_health() {
    let mut app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_empty_cart_for_new_browser() {
    let mut app = TestApp::new();
    let (status, body) = app.get("/cart").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_items"], 0);
    assert_eq!(body["subtotal"], "$0.00");
    assert_eq!(body["phase"], "ready");
}

#[tokio::test]
async fn test_guest_add_merges_and_counts() {
    let mut app = TestApp::new();

    app.post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;
    let (status, body) = app
        .post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["items"][0]["line_price"], "$240.00");
    assert_eq!(body["subtotal"], "$240.00");

    let (_, count) = app.get("/cart/count").await;
    assert_eq!(count["count"], 2);

    // Guests never write remotely
    app.wait_for_sync().await;
    assert!(app.remote.is_empty());
}

#[tokio::test]
async fn test_add_rejects_unparseable_price() {
    let mut app = TestApp::new();
    let (status, body) = app
        .post("/cart/items", add_body("air-runner", json!(42), "about 120"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("price_display"));

    let (_, count) = app.get("/cart/count").await;
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_update_and_remove() {
    let mut app = TestApp::new();
    app.post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;
    app.post("/cart/items", add_body("trail-max", json!("M"), "$80.00"))
        .await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/cart/items",
            Some(json!({ "product_id": "air-runner", "size": 42, "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 4);

    let (_, body) = app
        .send(
            Method::DELETE,
            "/cart/items",
            Some(json!({ "product_id": "trail-max", "size": "M" })),
        )
        .await;
    assert_eq!(body["total_items"], 3);

    let (_, body) = app
        .send(
            Method::PATCH,
            "/cart/items",
            Some(json!({ "product_id": "air-runner", "size": 42, "quantity": -1 })),
        )
        .await;
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_sign_in_loads_saved_cart_and_persists_changes() {
    let remote = Arc::new(MemoryCartStore::new());
    let user = UserId::generate();
    remote.insert(user, CartSnapshot::new(vec![line("saved-pair", 43_u32, 2)]));
    let mut app = TestApp::with_remote(Arc::clone(&remote));

    // Guest cart is replaced on sign-in
    app.post("/cart/items", add_body("guest-pick", json!(40), "$60.00"))
        .await;
    let (status, body) = app
        .post("/auth/sign-in", json!({ "user_id": user.to_string() }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 2);
    assert_eq!(body["items"][0]["product_id"], "saved-pair");

    app.post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;
    app.wait_for_sync().await;
    assert_eq!(remote.snapshot(user).unwrap().items.len(), 2);

    // Another browser signing in as the same user sees the saved cart
    let mut other = app.new_browser();
    let (_, body) = other
        .post("/auth/sign-in", json!({ "user_id": user.to_string() }))
        .await;
    assert_eq!(body["total_items"], 3);
}

#[tokio::test]
async fn test_sign_out_clears_local_cart_only() {
    let mut app = TestApp::new();
    let user = UserId::generate();

    app.post("/auth/sign-in", json!({ "user_id": user.to_string() }))
        .await;
    app.post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;
    app.wait_for_sync().await;

    let (status, body) = app.post("/auth/sign-out", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 0);
    assert_eq!(app.remote.snapshot(user).unwrap().items.len(), 1);

    // Signed-out mutations stay local
    app.post("/cart/items", add_body("trail-max", json!(44), "$95.00"))
        .await;
    app.wait_for_sync().await;
    assert_eq!(app.remote.snapshot(user).unwrap().items.len(), 1);
}

#[tokio::test]
async fn test_clear_deletes_remote_cart() {
    let mut app = TestApp::new();
    let user = UserId::generate();

    app.post("/auth/sign-in", json!({ "user_id": user.to_string() }))
        .await;
    app.post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;
    app.wait_for_sync().await;
    assert!(app.remote.snapshot(user).is_some());

    let (status, body) = app.send(Method::DELETE, "/cart", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 0);

    app.wait_for_sync().await;
    assert!(app.remote.snapshot(user).is_none());
}

#[tokio::test]
async fn test_sign_in_rejects_malformed_user_id() {
    let mut app = TestApp::new();
    let (status, _) = app
        .post("/auth/sign-in", json!({ "user_id": "not-a-uuid" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_auth_routes_require_gateway_secret() {
    let remote = Arc::new(MemoryCartStore::new());
    let user = UserId::generate();
    remote.insert(user, CartSnapshot::new(vec![line("saved-pair", 43_u32, 2)]));
    let mut app = TestApp::with_remote(Arc::clone(&remote));

    app.set_gateway_secret(None);
    let (status, body) = app
        .post("/auth/sign-in", json!({ "user_id": user.to_string() }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized: missing gateway secret");

    app.set_gateway_secret(Some("not-the-gateway-secret-0123456789ab"));
    let (status, _) = app
        .post("/auth/sign-in", json!({ "user_id": user.to_string() }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.post("/auth/sign-out", json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Still a guest: mutations stay local and the saved cart is untouched
    let (_, body) = app.get("/cart").await;
    assert_eq!(body["total_items"], 0);
    app.post("/cart/items", add_body("air-runner", json!(42), "$120.00"))
        .await;
    app.wait_for_sync().await;
    assert_eq!(remote.snapshot(user).unwrap().items.len(), 1);
    assert_eq!(remote.snapshot(user).unwrap().items[0].quantity.get(), 2);
}
