//! Cart line items and persisted cart snapshots.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{Price, PriceError};
use super::size::{Size, SizeSystem};

/// Product details captured when an item is added to the cart.
///
/// Display fields are copied from the catalog once and never re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub name: String,
    /// Currency-formatted price, e.g. `"$129.99"`.
    pub price_display: String,
    pub image_url: String,
    pub size: Size,
    pub size_system: SizeSystem,
}

impl NewCartItem {
    /// Turn into a cart line with the given quantity.
    #[must_use]
    pub fn into_line(self, quantity: NonZeroU32) -> CartLineItem {
        CartLineItem {
            product_id: self.product_id,
            name: self.name,
            price_display: self.price_display,
            image_url: self.image_url,
            size: self.size,
            size_system: self.size_system,
            quantity,
        }
    }
}

/// One line of a cart.
///
/// Lines are keyed by `(product_id, size)`. The quantity is never zero; a
/// line whose quantity would drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price_display: String,
    pub image_url: String,
    pub size: Size,
    pub size_system: SizeSystem,
    pub quantity: NonZeroU32,
}

impl CartLineItem {
    /// Whether this line is the one identified by `(product_id, size)`.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, size: &Size) -> bool {
        &self.product_id == product_id && &self.size == size
    }

    /// Unit price parsed from the display string.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the display string is malformed.
    pub fn unit_price(&self) -> Result<Price, PriceError> {
        Price::parse_display(&self.price_display)
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the display string is malformed or the
    /// multiplication overflows.
    pub fn line_price(&self) -> Result<Price, PriceError> {
        self.unit_price()?.checked_mul(self.quantity.get())
    }
}

/// Full serialized state of one user's cart at a point in time.
///
/// `updated_at` is informational only; remote writes are last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub updated_at: DateTime<Utc>,
}

impl CartSnapshot {
    /// Snapshot of `items` stamped with the current time.
    #[must_use]
    pub fn new(items: Vec<CartLineItem>) -> Self {
        Self {
            items,
            updated_at: Utc::now(),
        }
    }

    /// Snapshot with no items.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
