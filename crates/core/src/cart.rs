//! The in-session local cart.
//!
//! [`LocalCart`] is the authoritative list of line items for the current
//! session. It knows nothing about persistence: the storefront's sync
//! coordinator wraps it, emits notifications for its mutations, and mirrors
//! it to the remote store.

use std::num::NonZeroU32;

use crate::types::{
    CartLineItem, CartSnapshot, CurrencyCode, NewCartItem, Price, PriceError, ProductId, Size,
};

/// What [`LocalCart::add_item`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// An existing line with the same `(product_id, size)` was incremented.
    Merged {
        /// Quantity after the increment.
        quantity: NonZeroU32,
    },
    /// A new line was appended with quantity 1.
    Appended,
}

/// Ordered list of cart lines, unique by `(product_id, size)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCart {
    items: Vec<CartLineItem>,
}

impl LocalCart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from persisted lines.
    ///
    /// Lines sharing a `(product_id, size)` key are folded into the first
    /// occurrence so the uniqueness invariant holds even for snapshots
    /// written by older clients.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for line in items {
            match cart
                .items
                .iter_mut()
                .find(|existing| existing.matches(&line.product_id, &line.size))
            {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity.get());
                }
                None => cart.items.push(line),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add one unit of `item`.
    ///
    /// Increments the matching line if one exists, otherwise appends a new
    /// line with quantity 1.
    pub fn add_item(&mut self, item: NewCartItem) -> AddOutcome {
        if let Some(line) = self.find_mut(&item.product_id, &item.size) {
            line.quantity = line.quantity.saturating_add(1);
            return AddOutcome::Merged {
                quantity: line.quantity,
            };
        }
        self.items.push(item.into_line(NonZeroU32::MIN));
        AddOutcome::Appended
    }

    /// Remove the line for `(product_id, size)`.
    ///
    /// Returns `false` if there was no such line.
    pub fn remove_item(&mut self, product_id: &ProductId, size: &Size) -> bool {
        let before = self.items.len();
        self.items.retain(|line| !line.matches(product_id, size));
        self.items.len() != before
    }

    /// Set the quantity of the line for `(product_id, size)`.
    ///
    /// A quantity of zero or less removes the line. Quantities above
    /// `u32::MAX` saturate. Returns `false` if the cart did not change
    /// (no such line, or the quantity was already `quantity`).
    pub fn update_quantity(&mut self, product_id: &ProductId, size: &Size, quantity: i64) -> bool {
        let Some(quantity) = u64::try_from(quantity).ok().and_then(|q| {
            NonZeroU32::new(u32::try_from(q).unwrap_or(u32::MAX))
        }) else {
            return self.remove_item(product_id, size);
        };

        match self.find_mut(product_id, size) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    /// Remove every line. Returns `false` if the cart was already empty.
    pub fn clear(&mut self) -> bool {
        let had_items = !self.items.is_empty();
        self.items.clear();
        had_items
    }

    /// Replace the whole cart with persisted lines.
    pub fn replace(&mut self, items: Vec<CartLineItem>) {
        *self = Self::from_items(items);
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Sum of `quantity * unit price` over all lines.
    ///
    /// An empty cart totals zero in the default currency.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if any line's display price is malformed, if
    /// lines are priced in different currencies, or on overflow.
    pub fn total_price(&self) -> Result<Price, PriceError> {
        let mut lines = self.items.iter();
        let Some(first) = lines.next() else {
            return Ok(Price::zero(CurrencyCode::default()));
        };
        lines.try_fold(first.line_price()?, |total, line| {
            total.checked_add(line.line_price()?)
        })
    }

    /// Current contents as a timestamped snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::new(self.items.clone())
    }

    fn find_mut(&mut self, product_id: &ProductId, size: &Size) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|line| line.matches(product_id, size))
    }
}

impl From<CartSnapshot> for LocalCart {
    fn from(snapshot: CartSnapshot) -> Self {
        Self::from_items(snapshot.items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SizeSystem;

    fn item(product: &str, size: impl Into<Size>, price: &str) -> NewCartItem {
        NewCartItem {
            product_id: ProductId::from(product),
            name: product.to_uppercase(),
            price_display: price.to_string(),
            image_url: format!("https://cdn.stride.shop/{product}.jpg"),
            size: size.into(),
            size_system: SizeSystem::EU,
        }
    }

    fn quantities(cart: &LocalCart) -> Vec<(String, u32)> {
        cart.items()
            .iter()
            .map(|line| (line.product_id.to_string(), line.quantity.get()))
            .collect()
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = LocalCart::new();
        assert_eq!(cart.add_item(item("a", 42, "$10")), AddOutcome::Appended);
        for expected in 2..=5 {
            assert_eq!(
                cart.add_item(item("a", 42, "$10")),
                AddOutcome::Merged {
                    quantity: NonZeroU32::new(expected).unwrap()
                }
            );
        }
        assert_eq!(quantities(&cart), vec![("a".to_string(), 5)]);
    }

    #[test]
    fn test_add_different_size_appends() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$10"));
        cart.add_item(item("a", 43, "$10"));
        cart.add_item(item("b", 42, "$10"));
        assert_eq!(cart.len(), 3);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$10"));
        assert!(!cart.remove_item(&ProductId::from("a"), &Size::from(41_u32)));
        assert_eq!(cart.len(), 1);
        assert!(cart.remove_item(&ProductId::from("a"), &Size::from(42_u32)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_to_zero_equals_remove() {
        let build = || {
            let mut cart = LocalCart::new();
            cart.add_item(item("a", 42, "$10"));
            cart.add_item(item("b", "M", "$20"));
            cart.add_item(item("a", 42, "$10"));
            cart
        };

        for quantity in [0, -1, i64::MIN] {
            let mut updated = build();
            let mut removed = build();
            updated.update_quantity(&ProductId::from("a"), &Size::from(42_u32), quantity);
            removed.remove_item(&ProductId::from("a"), &Size::from(42_u32));
            assert_eq!(updated, removed);
        }

        let mut updated = LocalCart::new();
        assert!(!updated.update_quantity(&ProductId::from("zzz"), &Size::from(1_u32), 0));
        assert!(updated.is_empty());
    }

    #[test]
    fn test_update_sets_exact_quantity() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$10"));
        assert!(cart.update_quantity(&ProductId::from("a"), &Size::from(42_u32), 7));
        assert!(!cart.update_quantity(&ProductId::from("a"), &Size::from(42_u32), 7));
        assert_eq!(cart.total_items(), 7);
    }

    #[test]
    fn test_update_absent_does_not_insert() {
        let mut cart = LocalCart::new();
        assert!(!cart.update_quantity(&ProductId::from("a"), &Size::from(42_u32), 3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_twice() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$10"));
        assert!(cart.clear());
        assert!(!cart.clear());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$19.99"));
        cart.add_item(item("a", 42, "$19.99"));
        cart.add_item(item("b", "M", "$5.01"));
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price().unwrap().display(), "$44.99");
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(LocalCart::new().total_price().unwrap().display(), "$0.00");
    }

    #[test]
    fn test_total_price_fails_loudly() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$19.99"));
        cart.add_item(item("b", 42, "N/A"));
        assert!(matches!(
            cart.total_price(),
            Err(PriceError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn test_total_price_mixed_currency() {
        let mut cart = LocalCart::new();
        cart.add_item(item("a", 42, "$19.99"));
        cart.add_item(item("b", 42, "€19.99"));
        assert!(matches!(
            cart.total_price(),
            Err(PriceError::MixedCurrency { .. })
        ));
    }

    #[test]
    fn test_from_items_folds_duplicates() {
        let lines = vec![
            item("a", 42, "$10").into_line(NonZeroU32::new(2).unwrap()),
            item("b", 42, "$10").into_line(NonZeroU32::MIN),
            item("a", 42, "$10").into_line(NonZeroU32::new(3).unwrap()),
        ];
        let cart = LocalCart::from_items(lines);
        assert_eq!(
            quantities(&cart),
            vec![("a".to_string(), 5), ("b".to_string(), 1)]
        );
    }
}
