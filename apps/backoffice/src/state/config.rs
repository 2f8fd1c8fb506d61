//! # Configuration State
//!
//! Back-office configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`DUKAN_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use dukan_core::Money;

/// Pakistan Standard Time, UTC+05:00.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 5 * 60;

/// Back-office configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// SQLite file backing the ledger.
    pub db_path: PathBuf,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Offset used for analytics windows when the session has none.
    pub utc_offset_minutes: i32,

    /// Length of a paid subscription period in calendar months.
    pub subscription_months: u32,
}

impl Default for ConfigState {
    /// ## Default Values
    /// - Database: `./dukan.db`
    /// - Currency: Rs
    /// - Offset: UTC+05:00
    /// - Subscription period: 1 month
    fn default() -> Self {
        ConfigState {
            db_path: PathBuf::from("dukan.db"),
            currency_symbol: "Rs".to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            subscription_months: 1,
        }
    }
}

impl ConfigState {
    /// Creates a new ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `DUKAN_DB_PATH`: Database file
    /// - `DUKAN_CURRENCY_SYMBOL`: Currency symbol (e.g., "Rs", "Af")
    /// - `DUKAN_UTC_OFFSET_MINUTES`: Default offset (e.g., "300", "270")
    /// - `DUKAN_SUBSCRIPTION_MONTHS`: Paid period length (e.g., "1")
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("DUKAN_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(symbol) = lookup("DUKAN_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("DUKAN_UTC_OFFSET_MINUTES") {
            match raw.trim().parse::<i32>() {
                Ok(minutes) if offset_from_minutes(minutes).is_some() => {
                    config.utc_offset_minutes = minutes;
                }
                _ => warn!(value = %raw, "Ignoring invalid DUKAN_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(raw) = lookup("DUKAN_SUBSCRIPTION_MONTHS") {
            match raw.trim().parse::<u32>() {
                Ok(months) if months > 0 => config.subscription_months = months,
                _ => warn!(value = %raw, "Ignoring invalid DUKAN_SUBSCRIPTION_MONTHS"),
            }
        }

        config
    }

    /// The configured default offset. Out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }

    /// Formats an amount with the currency symbol.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(170_000)), "Rs 1,700.00");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let cents = amount.cents();
        let whole = (cents / 100).unsigned_abs().to_string();

        // Group thousands: 1700 → 1,700
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        format!(
            "{}{} {}.{:02}",
            if cents < 0 { "-" } else { "" },
            self.currency_symbol,
            grouped,
            (cents % 100).abs()
        )
    }
}

pub(crate) fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}
