//! # Cart Builder
//!
//! The in-progress sale: an ordered list of lines, at most one per product.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Action              Method              Effect                         │
//! │  ──────              ──────              ──────                         │
//! │                                                                         │
//! │  Tap product ──────► add_item() ───────► new line, or merge into the   │
//! │                                          existing line for the product │
//! │                                                                         │
//! │  Click remove ─────► remove_item() ────► line dropped (no-op if absent)│
//! │                                                                         │
//! │  Sale posted ──────► clear() ──────────► lines emptied                 │
//! │                                                                         │
//! │  View totals ──────► totals() ─────────► (read only)                   │
//! │                                                                         │
//! │  NOTE: The stock check here is against the product snapshot the        │
//! │        caller passed in. The authoritative check happens again when   │
//! │        the sale is committed.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`
//! - Every line has `quantity >= 1`
//! - `subtotal = quantity × unit_price`, `profit = quantity × (unit_price − purchase_price)`
//! - A failed `add_item` leaves the cart exactly as it was

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_amount_cents, validate_quantity};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
///
/// Prices are captured from the product when the line is created and
/// refreshed whenever the same product is added again. The sale engine
/// records exactly these prices, not whatever the catalog says at commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,

    /// English product name (frozen into the sale line as its snapshot).
    pub name: String,

    pub unit_price_cents: i64,

    pub purchase_price_cents: i64,

    pub quantity: i64,

    pub subtotal_cents: i64,

    pub profit_cents: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        let mut line = CartLine {
            product_id: product.id.clone(),
            name: product.name_en.clone(),
            unit_price_cents: product.selling_price_cents,
            purchase_price_cents: product.purchase_price_cents,
            quantity,
            subtotal_cents: 0,
            profit_cents: 0,
        };
        line.recompute();
        line
    }

    fn recompute(&mut self) {
        let unit_price = Money::from_cents(self.unit_price_cents);
        let unit_cost = Money::from_cents(self.purchase_price_cents);

        self.subtotal_cents = unit_price.multiply_quantity(self.quantity).cents();
        self.profit_cents = (unit_price - unit_cost).multiply_quantity(self.quantity).cents();
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// ## Errors
    /// - `Validation` when `quantity` is not in `1..=MAX_ITEM_QUANTITY`, the
    ///   merged line would exceed it, or a price is outside
    ///   `0..=MAX_AMOUNT_CENTS`
    /// - `OutOfStock` when the line's new quantity would exceed
    ///   `product.quantity`
    /// - `CartTooLarge` when a new line would exceed `MAX_CART_ITEMS`
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::Utc;
    /// # use dukan_core::{Cart, Product};
    /// # let product = Product {
    /// #     id: "p1".into(), account_id: "a1".into(), name_en: "Rice".into(),
    /// #     name_ur: None, name_ps: None, purchase_price_cents: 6_000,
    /// #     selling_price_cents: 10_000, quantity: 5, unit: "kg".into(),
    /// #     category: None, low_stock_threshold: 1,
    /// #     created_at: Utc::now(), updated_at: Utc::now(),
    /// # };
    /// let mut cart = Cart::new();
    /// cart.add_item(&product, 3).unwrap();
    /// assert!(cart.add_item(&product, 3).is_err());
    /// assert_eq!(cart.totals().total_quantity, 3);
    /// ```
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_amount_cents("selling price", product.selling_price_cents)?;
        validate_amount_cents("purchase price", product.purchase_price_cents)?;

        let existing = self.lines.iter().position(|l| l.product_id == product.id);
        let already_in_cart = existing.map_or(0, |i| self.lines[i].quantity);
        let requested = already_in_cart + quantity;

        if !product.can_sell(requested) {
            return Err(CoreError::OutOfStock {
                product: product.name_en.clone(),
                available: product.quantity,
                requested,
            });
        }

        // Bounded line quantity and prices keep every total inside i64
        validate_quantity(requested)?;

        match existing {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = requested;
                line.unit_price_cents = product.selling_price_cents;
                line.purchase_price_cents = product.purchase_price_cents;
                line.recompute();
            }
            None => {
                if self.lines.len() >= MAX_CART_ITEMS {
                    return Err(CoreError::CartTooLarge {
                        max: MAX_CART_ITEMS,
                    });
                }
                self.lines.push(CartLine::from_product(product, quantity));
            }
        }

        Ok(())
    }

    /// Removes the line for `product_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product_id` already in the cart.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Summary used by the checkout screen and the sale engine.
    pub fn totals(&self) -> CartTotals {
        CartTotals {
            item_count: self.lines.len(),
            total_quantity: self.lines.iter().map(|l| l.quantity).sum(),
            subtotal_cents: self.lines.iter().map(|l| l.subtotal()).sum::<Money>().cents(),
            profit_cents: self.lines.iter().map(|l| l.profit()).sum::<Money>().cents(),
        }
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Number of distinct lines.
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub profit_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        cart.totals()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_product(id: &str, sell: i64, buy: i64, quantity: i64) -> Product {
        Product {
            id: id.to_string(),
            account_id: "acc".to_string(),
            name_en: format!("Product {}", id),
            name_ur: None,
            name_ps: None,
            purchase_price_cents: buy,
            selling_price_cents: sell,
            quantity,
            unit: "piece".to_string(),
            category: None,
            low_stock_threshold: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item_computes_line() {
        let mut cart = Cart::new();
        let product = test_product("A", 10_000, 6_000, 5);

        cart.add_item(&product, 3).unwrap();

        let line = &cart.lines()[0];
        assert_eq!(line.quantity, 3);
        assert_eq!(line.subtotal_cents, 30_000);
        assert_eq!(line.profit_cents, 12_000);
    }

    #[test]
    fn test_add_over_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        let product = test_product("A", 10_000, 6_000, 5);

        cart.add_item(&product, 3).unwrap();
        let before = cart.clone();

        let err = cart.add_item(&product, 3).unwrap_err();
        assert!(matches!(
            err,
            CoreError::OutOfStock {
                available: 5,
                requested: 6,
                ..
            }
        ));
        assert_eq!(cart, before);
        assert_eq!(cart.quantity_of("A"), 3);
    }

    #[test]
    fn test_add_exactly_available_stock() {
        let mut cart = Cart::new();
        let product = test_product("A", 100, 50, 5);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of("A"), 5);
    }

    #[test]
    fn test_zero_stock_product_rejected() {
        let mut cart = Cart::new();
        let product = test_product("A", 100, 50, 0);
        assert!(cart.add_item(&product, 1).is_err());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let mut cart = Cart::new();
        let product = test_product("A", 100, 50, 5);
        assert!(matches!(cart.add_item(&product, 0), Err(CoreError::Validation(_))));
        assert!(matches!(cart.add_item(&product, -2), Err(CoreError::Validation(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_oversized_price_rejected_without_overflow() {
        let mut cart = Cart::new();
        let product = test_product("A", i64::MAX / 100, 50, 500);

        let err = cart.add_item(&product, 200).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(cart.is_empty());

        let costly = test_product("B", 100, crate::MAX_AMOUNT_CENTS + 1, 5);
        assert!(matches!(cart.add_item(&costly, 1), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_largest_cart_totals_fit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            let product = test_product(&i.to_string(), crate::MAX_AMOUNT_CENTS, 0, 2_000);
            cart.add_item(&product, crate::MAX_ITEM_QUANTITY).unwrap();
        }

        let totals = cart.totals();
        let expected = crate::MAX_AMOUNT_CENTS * crate::MAX_ITEM_QUANTITY * MAX_CART_ITEMS as i64;
        assert_eq!(totals.subtotal_cents, expected);
        assert_eq!(totals.profit_cents, expected);
    }

    #[test]
    fn test_merged_line_capped_at_max_quantity() {
        let mut cart = Cart::new();
        let product = test_product("A", 100, 50, 5_000);

        cart.add_item(&product, crate::MAX_ITEM_QUANTITY).unwrap();
        let err = cart.add_item(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(cart.quantity_of("A"), crate::MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_merge_refreshes_prices() {
        let mut cart = Cart::new();
        let mut product = test_product("A", 100, 60, 10);
        cart.add_item(&product, 1).unwrap();

        product.selling_price_cents = 120;
        cart.add_item(&product, 2).unwrap();

        let line = &cart.lines()[0];
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price_cents, 120);
        assert_eq!(line.subtotal_cents, 360);
        assert_eq!(line.profit_cents, 180);
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("A", 100, 50, 5), 1).unwrap();
        cart.add_item(&test_product("B", 200, 50, 5), 1).unwrap();

        assert!(cart.remove_item("A"));
        assert!(!cart.remove_item("A"));
        assert!(!cart.remove_item("missing"));
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, "B");
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("A", 100, 60, 5), 2).unwrap();
        cart.add_item(&test_product("B", 250, 300, 5), 1).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
        assert_eq!(totals.subtotal_cents, 450);
        // Selling B below cost drags profit down
        assert_eq!(totals.profit_cents, 80 - 50);
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string(), 100, 50, 5), 1).unwrap();
        }

        let err = cart.add_item(&test_product("extra", 100, 50, 5), 1).unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));

        // Merging into an existing line is still allowed
        cart.add_item(&test_product("0", 100, 50, 5), 1).unwrap();
        assert_eq!(cart.quantity_of("0"), 2);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("A", 100, 50, 5), 2).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.totals().subtotal_cents, 0);
    }
}
