//! # dukan-db: Database Layer for the Dukan Ledger
//!
//! This crate provides persistence for the ledger: accounts, catalog,
//! sales, expenses, coupons and subscriptions. It uses SQLite through sqlx
//! with async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dukan Ledger Data Flow                           │
//! │                                                                         │
//! │  backoffice command (commit_sale, dashboard, change_subscription)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dukan-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ AccountRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │    │ ProductRepo   │    │ 001_initial_ │  │   │
//! │  │   │ Connection    │◄───│ SaleRepo      │    │   schema.sql │  │   │
//! │  │   │ Management    │    │ Subscription  │    │              │  │   │
//! │  │   └───────────────┘    │ LedgerRepo    │    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   $DUKAN_DB_PATH (default ./dukan.db) or :memory: for tests     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (account, sale, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dukan_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("dukan.db")).await?;
//!
//! let catalog = db.products().list(&account_id, Some(10)).await?;
//! let sale = db.sales().commit_sale(&new_sale).await?;
//! let ledger = db.ledger().load(&account_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::AccountRepository;
pub use repository::coupon::CouponRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::product::{generate_product_id, ProductRepository};
pub use repository::sale::{NewSale, SaleRepository};
pub use repository::subscription::{RevenueSummary, SubscriptionChange, SubscriptionRepository};
