//! # dukan-core: Pure Business Logic for the Dukan Ledger
//!
//! This crate is the **heart** of the ledger. It contains the cart math,
//! the subscription entitlement gate, coupon pricing and the analytics
//! aggregation as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dukan Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Presentation layer (web)                     │   │
//! │  │     Sales page ──► Dashboard ──► Reports ──► Subscription       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 backoffice commands (apps/backoffice)           │   │
//! │  │   add_to_cart, commit_sale, compute_dashboard, quote, ...       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dukan-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────┐ ┌─────────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │  │  types  │ │ cart │ │ entitlement │ │ pricing │ │analytics │ │   │
//! │  │  └─────────┘ └──────┘ └─────────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    dukan-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, atomic sale commit           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Account, Product, Sale, Coupon, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`entitlement`] - Subscription tier gate
//! - [`cart`] - Cart builder staging line items before a sale
//! - [`pricing`] - Coupon-priced subscription quotes
//! - [`analytics`] - Dashboard and report aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use dukan_core::money::Money;
//! use dukan_core::pricing::{quote, Discount};
//! use dukan_core::SubscriptionTier;
//!
//! // Standard costs 200; a 250 coupon floors the price at zero.
//! let discount = Discount::new("BIGSAVE", Money::from_major(250));
//! let price = quote(SubscriptionTier::Standard, Some(&discount));
//! assert_eq!(price.final_amount, 0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod cart;
pub mod entitlement;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use entitlement::Entitlement;
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in the cart.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest accepted price or amount in minor units (one billion major).
///
/// `MAX_AMOUNT_CENTS * MAX_ITEM_QUANTITY * MAX_CART_ITEMS` stays well
/// inside `i64`, so line and cart totals never overflow.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Number of top products shown on the dashboard.
pub const TOP_PRODUCTS_LIMIT: usize = 5;
