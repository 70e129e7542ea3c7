//! Cart line items and derived totals.
//!
//! The backend owns the cart. This is the in-memory copy the storefront
//! refetches after every mutation, plus the totals derived from it.

use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, CurrencyCode, Money, ProductId};

/// The product a cart line points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A single cart line.
///
/// The backend guarantees `quantity >= 1`; a line that would drop to zero
/// is deleted instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: ProductRef,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// The shopper's cart as last fetched from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Set while a mutation has been sent but its refetch has not landed.
    #[serde(default, skip_serializing)]
    pub pending_updates: bool,
}

impl Cart {
    #[must_use]
    pub fn new(items: Vec<CartItem>) -> Self {
        Self {
            items,
            pending_updates: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        total_quantity(&self.items)
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        if self.items.is_empty() {
            return Money::zero(CurrencyCode::default());
        }
        self.items.iter().map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn find(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the cart can be checked out right now.
    #[must_use]
    pub fn ready_for_checkout(&self) -> bool {
        !self.is_empty() && !self.pending_updates
    }
}

/// Units across `items`, capped at `u32::MAX`.
pub(crate) fn total_quantity(items: &[CartItem]) -> u32 {
    items
        .iter()
        .fold(0_u32, |count, item| count.saturating_add(item.quantity))
}

#[cfg(test)]
pub(crate) mod tests {
    use rust_decimal::Decimal;

    use super::*;

    pub(crate) fn item(id: i64, product: i64, quantity: u32, price: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            product: ProductRef {
                id: ProductId::new(product),
                name: format!("Product {product}"),
                image_url: None,
            },
            quantity,
            unit_price: Money::inr(Decimal::new(price, 0)),
        }
    }

    #[test]
    fn test_totals() {
        let cart = Cart::new(vec![item(1, 10, 2, 150), item(2, 11, 1, 99)]);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Money::inr(Decimal::new(399, 0)));
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
        assert!(cart.subtotal().is_zero());
        assert!(!cart.ready_for_checkout());
    }

    #[test]
    fn test_pending_updates_block_checkout() {
        let mut cart = Cart::new(vec![item(1, 10, 1, 100)]);
        assert!(cart.ready_for_checkout());
        cart.pending_updates = true;
        assert!(!cart.ready_for_checkout());
    }

    #[test]
    fn test_item_count_saturates() {
        let cart = Cart::new(vec![item(1, 10, u32::MAX, 1), item(2, 11, 7, 1)]);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn test_find_line() {
        let cart = Cart::new(vec![item(4, 10, 1, 100)]);
        assert!(cart.find(CartItemId::new(4)).is_some());
        assert!(cart.find(CartItemId::new(5)).is_none());
    }
}
