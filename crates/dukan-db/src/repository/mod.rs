//! # Repository Module
//!
//! Database repository implementations for the ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  backoffice command                                                    │
//! │       │                                                                 │
//! │       │  db.sales().commit_sale(&new_sale)                             │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── commit_sale(&self, new_sale)     ← one transaction               │
//! │  ├── get_by_id(&self, account, id)                                     │
//! │  └── line_items(&self, sale_id)                                        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every query is scoped by account_id: one account can never read or   │
//! │  write another account's rows through these APIs.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`] - Accounts and their subscription state
//! - [`ProductRepository`] - Catalog CRUD and restocking
//! - [`SaleRepository`] - Atomic sale commit and sale reads
//! - [`ExpenseRepository`] - Expense recording
//! - [`CouponRepository`] - Coupon lookup and administration
//! - [`SubscriptionRepository`] - Atomic tier change and history
//! - [`LedgerRepository`] - Bulk reads feeding the analytics engine
//!
//! [`AccountRepository`]: account::AccountRepository
//! [`ProductRepository`]: product::ProductRepository
//! [`SaleRepository`]: sale::SaleRepository
//! [`ExpenseRepository`]: expense::ExpenseRepository
//! [`CouponRepository`]: coupon::CouponRepository
//! [`SubscriptionRepository`]: subscription::SubscriptionRepository
//! [`LedgerRepository`]: ledger::LedgerRepository

pub mod account;
pub mod coupon;
pub mod expense;
pub mod ledger;
pub mod product;
pub mod sale;
pub mod subscription;

/// Shared fixtures for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use dukan_core::{Account, Product, SubscriptionTier};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn test_account(db: &Database, tier: SubscriptionTier) -> Account {
        db.accounts().create("Test Store", tier).await.unwrap()
    }

    /// Inserts a product selling at `sell` and bought at `buy` (minor units).
    pub async fn test_product(
        db: &Database,
        account_id: &str,
        name: &str,
        sell: i64,
        buy: i64,
        quantity: i64,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            name_en: name.to_string(),
            name_ur: None,
            name_ps: None,
            purchase_price_cents: buy,
            selling_price_cents: sell,
            quantity,
            unit: "piece".to_string(),
            category: None,
            low_stock_threshold: 1,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }
}
