//! # Dukan Back-Office Library
//!
//! Session state and commands for the Dukan Ledger. Any presentation layer
//! (the `dukan` CLI in this crate, a desktop shell, a web handler) drives
//! the ledger through these commands and receives serde DTOs or an
//! [`ApiError`].
//!
//! ## Module Organization
//! ```text
//! dukan_backoffice/
//! ├── lib.rs          ◄─── You are here (startup helpers)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Cart state (Mutex)
//! │   ├── pricing.rs  ◄─── Tier selection + applied coupon (Mutex)
//! │   ├── session.rs  ◄─── Account, locale, UTC offset
//! │   └── config.rs   ◄─── DUKAN_* configuration
//! ├── commands/
//! │   ├── cart.rs, sale.rs, analytics.rs
//! │   ├── subscription.rs, product.rs, expense.rs, admin.rs
//! │   └── mod.rs      ◄─── Entitlement resolution shared by commands
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Per-Session State                                    │
//! │                                                                         │
//! │  ┌──────────────┐ ┌─────────────┐ ┌──────────────┐ ┌────────────────┐  │
//! │  │   DbState    │ │  CartState  │ │ PricingState │ │ SessionContext │  │
//! │  │              │ │             │ │              │ │                │  │
//! │  │ • pool       │ │ • lines     │ │ • tier       │ │ • account id   │  │
//! │  │ • repos      │ │ • totals    │ │ • coupon     │ │ • locale       │  │
//! │  │  (shared)    │ │ (1/session) │ │ (1/session)  │ │ • UTC offset   │  │
//! │  └──────────────┘ └─────────────┘ └──────────────┘ └────────────────┘  │
//! │                                                                         │
//! │  Each command takes only the state it needs.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use error::{ApiError, ErrorCode};
pub use state::{CartState, ConfigState, DbState, PricingState, SessionContext};

use dukan_db::{Database, DbConfig, DbResult};

/// Opens the ledger database named by `config`, applying migrations.
pub async fn open_database(config: &ConfigState) -> DbResult<DbState> {
    info!(db_path = %config.db_path.display(), "Opening ledger database");
    let db = Database::new(DbConfig::new(config.db_path.clone())).await?;
    Ok(DbState::new(db))
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=dukan_db=trace` - Trace the database layer only
/// - Default: `info,dukan=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dukan=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
