//! # Cart Commands
//!
//! Building the session's cart.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐                        │
//! │  │  Empty   │────►│ In Cart  │────►│ Committed│                        │
//! │  │  Cart    │     │          │     │   Sale   │                        │
//! │  └──────────┘     └──────────┘     └──────────┘                        │
//! │       ▲                │                 │                              │
//! │       │           add_to_cart       commit_sale                        │
//! │       │           remove_from_cart  (sale.rs, clears on success)       │
//! │       │                │                 │                              │
//! │       └── clear_cart ◄─┘◄────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{CartState, DbState, SessionContext};
use dukan_core::{Cart, CartLine, CartTotals, CoreError};

/// Cart response including lines and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        CartView {
            lines: cart.lines().to_vec(),
            totals: cart.totals(),
        }
    }
}

/// Gets the current cart contents.
pub fn get_cart(cart: &CartState) -> CartView {
    cart.with_cart(|c| CartView::from(c))
}

/// Adds `quantity` units of a catalog product.
///
/// The product is reloaded so stock and prices are current; adding an
/// already-present product merges into its line at the current price.
///
/// ## Errors
/// - `NOT_FOUND` when the product is not in this account's catalog
/// - `VALIDATION_ERROR` for a quantity outside 1..=999 or a full cart
/// - `OUT_OF_STOCK` when line quantity would exceed stock; cart unchanged
pub async fn add_to_cart(
    db: &DbState,
    cart: &CartState,
    session: &SessionContext,
    product_id: &str,
    quantity: i64,
) -> Result<CartView, ApiError> {
    debug!(product_id = %product_id, quantity = %quantity, "add_to_cart command");

    let product = db
        .inner()
        .products()
        .get_by_id(&session.account_id, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

    cart.with_cart_mut(|c| -> Result<CartView, ApiError> {
        c.add_item(&product, quantity)?;
        Ok(CartView::from(&*c))
    })
}

/// Removes a product's line. Absent products are ignored.
pub fn remove_from_cart(cart: &CartState, product_id: &str) -> CartView {
    debug!(product_id = %product_id, "remove_from_cart command");
    cart.with_cart_mut(|c| {
        c.remove_item(product_id);
        CartView::from(&*c)
    })
}

pub fn clear_cart(cart: &CartState) -> CartView {
    debug!("clear_cart command");
    cart.with_cart_mut(|c| {
        c.clear();
        CartView::from(&*c)
    })
}
