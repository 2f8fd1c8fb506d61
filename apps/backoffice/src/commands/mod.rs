//! # Commands Module
//!
//! Every operation the presentation layer can invoke.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs           ◄─── You are here (exports, shared helpers)
//! ├── cart.rs          ◄─── Cart building
//! ├── sale.rs          ◄─── Atomic sale commit, sale reads
//! ├── analytics.rs     ◄─── Dashboard and windowed reports
//! ├── subscription.rs  ◄─── Tier quotes, coupons, tier change
//! ├── product.rs       ◄─── Catalog with the entitlement product limit
//! ├── expense.rs       ◄─── Expense recording
//! ├── settings.rs      ◄─── Stored account preferences (locale)
//! └── admin.rs         ◄─── Cross-account summary, coupons (admin only)
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  async fn add_to_cart(                                                  │
//! │      db: &DbState,             ◄── shared pool                         │
//! │      cart: &CartState,         ◄── this session's cart                 │
//! │      session: &SessionContext, ◄── account, locale, offset             │
//! │      product_id: &str,         ◄── caller params                       │
//! │      quantity: i64,                                                     │
//! │  ) -> Result<CartView, ApiError>                                        │
//! │         │                                                               │
//! │         │ (serde, camelCase)                                            │
//! │         ▼                                                               │
//! │  Presentation layer receives CartView or { code, message }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands that depend on the plan take `now` and resolve the
//! [`Entitlement`] from a freshly loaded account on every call.

pub mod admin;
pub mod analytics;
pub mod cart;
pub mod expense;
pub mod product;
pub mod sale;
pub mod settings;
pub mod subscription;

use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::state::{DbState, SessionContext};
use dukan_core::{Account, Entitlement};

/// Loads the session's account and resolves its entitlement at `now`.
pub(crate) async fn resolve_entitlement(
    db: &DbState,
    session: &SessionContext,
    now: DateTime<Utc>,
) -> Result<(Account, Entitlement), ApiError> {
    let account = db.inner().accounts().require(&session.account_id).await?;
    let entitlement = Entitlement::resolve(&account, now);
    Ok((account, entitlement))
}
