//! Integration tests for Stride.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stride-integration-tests
//! ```
//!
//! No database is required: the HTTP tests drive the full router with an
//! in-memory session store and [`MemoryCartStore`] as the remote, and the
//! pool handed to the app state is never connected.
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart session sync behavior through the public API
//! - `http_api` - JSON routes, cookies, sign-in/sign-out

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use url::Url;

use stride_core::{CartLineItem, NewCartItem, ProductId, Size, SizeSystem};
use stride_storefront::cart::{MemoryCartStore, RemoteCartStore};
use stride_storefront::config::{CartConfig, StorefrontConfig};
use stride_storefront::middleware::{
    GATEWAY_SECRET_HEADER, SESSION_COOKIE_NAME, session::session_layer,
};
use stride_storefront::router;
use stride_storefront::state::AppState;

/// Debounce used by [`TestApp`]; short so tests can wait it out in real time.
pub const TEST_DEBOUNCE: Duration = Duration::from_millis(20);

/// Gateway secret configured in [`test_config`].
pub const TEST_GATEWAY_SECRET: &str = "test-gateway-secret-0123456789abcdef";

/// Build a catalog item for tests.
#[must_use]
pub fn item(product_id: &str, size: impl Into<Size>, price_display: &str) -> NewCartItem {
    NewCartItem {
        product_id: ProductId::from(product_id),
        name: product_id.to_string(),
        price_display: price_display.to_string(),
        image_url: format!("https://cdn.stride.shop/{product_id}.jpg"),
        size: size.into(),
        size_system: SizeSystem::EU,
    }
}

/// Build a cart line for seeding the remote store.
#[must_use]
pub fn line(product_id: &str, size: impl Into<Size>, quantity: u32) -> CartLineItem {
    item(product_id, size, "$10.00").into_line(NonZeroU32::new(quantity).unwrap_or(NonZeroU32::MIN))
}

/// Storefront configuration for tests.
///
/// # Panics
///
/// Never in practice; the literals are valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/stride_test"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").unwrap(),
        gateway_secret: SecretString::from(TEST_GATEWAY_SECRET),
        cart: CartConfig {
            debounce: TEST_DEBOUNCE,
            ..CartConfig::default()
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// The storefront router plus a cookie jar holding one browser session.
///
/// Requests carry the gateway secret unless [`TestApp::set_gateway_secret`]
/// changes it.
pub struct TestApp {
    router: Router,
    /// Remote cart store shared by every cart session in the app.
    pub remote: Arc<MemoryCartStore>,
    cookie: Option<String>,
    gateway_secret: Option<String>,
}

impl TestApp {
    /// Build an app whose carts persist to a fresh [`MemoryCartStore`].
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be configured.
    #[must_use]
    pub fn new() -> Self {
        Self::with_remote(Arc::new(MemoryCartStore::new()))
    }

    /// Build an app over an existing remote store.
    ///
    /// # Panics
    ///
    /// Panics if the lazy pool cannot be configured.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn with_remote(remote: Arc<MemoryCartStore>) -> Self {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://localhost/stride_test")
            .unwrap();
        let layer = session_layer(MemoryStore::default(), &config);
        let store: Arc<dyn RemoteCartStore> = remote.clone();
        let state = AppState::with_remote(config, pool, store);

        Self {
            router: router(state, layer),
            remote,
            cookie: None,
            gateway_secret: Some(TEST_GATEWAY_SECRET.to_string()),
        }
    }

    /// A second browser against the same app and remote store.
    #[must_use]
    pub fn new_browser(&self) -> Self {
        Self {
            router: self.router.clone(),
            remote: Arc::clone(&self.remote),
            cookie: None,
            gateway_secret: Some(TEST_GATEWAY_SECRET.to_string()),
        }
    }

    /// Secret sent in the gateway header; `None` omits the header.
    pub fn set_gateway_secret(&mut self, secret: Option<&str>) {
        self.gateway_secret = secret.map(str::to_string);
    }

    /// Send a request, keeping the session cookie, and decode the JSON body.
    ///
    /// Non-JSON bodies are returned as a JSON string.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(secret) = &self.gateway_secret {
            builder = builder.header(GATEWAY_SECRET_HEADER, secret);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            if let Some(pair) = value.split(';').next()
                && pair.starts_with(&format!("{SESSION_COOKIE_NAME}="))
            {
                self.cookie = Some(pair.to_string());
            }
        }

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    /// `GET` helper.
    pub async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    /// `POST` helper.
    pub async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    /// Wait until any debounced remote write has fired.
    pub async fn wait_for_sync(&self) {
        tokio::time::sleep(TEST_DEBOUNCE * 5).await;
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
