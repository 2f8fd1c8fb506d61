//! # Cart State
//!
//! Holds the session's in-progress cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  User Action              Command                 Cart State Change     │
//! │  ───────────              ───────                 ─────────────────     │
//! │                                                                         │
//! │  Pick Product ───────────► add_to_cart() ───────► merge or push line   │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_cart() ──► retain others        │
//! │                                                                         │
//! │  Click Clear ────────────► clear_cart() ────────► lines.clear()        │
//! │                                                                         │
//! │  Checkout ───────────────► commit_sale() ───────► cleared on success   │
//! │                                                                         │
//! │  NOTE: The lock is held only for the closure, never across an .await. │
//! │        Commits work on a snapshot of the lines.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use dukan_core::Cart;

/// Session cart state.
///
/// ## Poisoning
/// A panic while the lock is held cannot leave the cart half-updated
/// (every `Cart` mutation validates before writing), so a poisoned lock is
/// recovered instead of propagated.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        CartState::default()
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| cart.totals());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// cart_state.with_cart_mut(|cart| cart.add_item(&product, 1))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut cart)
    }
}
