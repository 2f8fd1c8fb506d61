//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! The `Database` struct from `dukan-db` contains a `SqlitePool` which is
//! inherently thread-safe. Multiple commands can execute queries
//! concurrently without explicit locking.

use dukan_db::Database;

/// Wrapper around `Database` for command state.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let ledger = db_state.inner().ledger().load(&session.account_id).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
