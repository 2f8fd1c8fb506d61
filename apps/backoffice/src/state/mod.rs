//! # State Module
//!
//! Manages per-session state for the back-office.
//!
//! Instead of a single `AppState` struct containing everything, each
//! concern gets its own state type and every command declares exactly the
//! state it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐                  │
//! │  │   DbState    │  │  CartState   │  │ PricingState │                  │
//! │  │              │  │              │  │              │                  │
//! │  │  Database    │  │  Mutex<Cart> │  │ Mutex<       │                  │
//! │  │  (SQLite     │  │              │  │  Pricing     │                  │
//! │  │   pool)      │  │              │  │  Session>    │                  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘                  │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────────────────┐                    │
//! │  │ ConfigState  │  │ SessionContext               │                    │
//! │  │ (read-only)  │  │ account_id, locale, offset   │                    │
//! │  └──────────────┘  └──────────────────────────────┘                    │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • CartState / PricingState: Mutex, never held across an .await       │
//! │  • ConfigState / SessionContext: plain values                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session never caches the entitlement: commands reload the account
//! and resolve it on every call.

mod cart;
mod config;
mod db;
mod pricing;
mod session;

pub use cart::CartState;
pub use config::ConfigState;
pub use db::DbState;
pub use pricing::PricingState;
pub use session::SessionContext;
