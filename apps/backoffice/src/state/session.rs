//! # Session Context
//!
//! Who is acting, in which language, in which timezone. Passed explicitly
//! into every command; there is no ambient "current user".

use chrono::{DateTime, FixedOffset, Utc};

use dukan_core::analytics::AnalyticsContext;
use dukan_core::{Account, Entitlement, Locale};

use super::ConfigState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub account_id: String,
    pub locale: Locale,
    /// Offset used to cut analytics windows at local midnight.
    pub utc_offset: FixedOffset,
}

impl SessionContext {
    pub fn new(account_id: impl Into<String>, locale: Locale, utc_offset: FixedOffset) -> Self {
        SessionContext {
            account_id: account_id.into(),
            locale,
            utc_offset,
        }
    }

    /// Session for `account` using its stored locale and the configured
    /// default offset.
    pub fn for_account(account: &Account, config: &ConfigState) -> Self {
        SessionContext::new(account.id.clone(), account.locale, config.utc_offset())
    }

    pub fn analytics_context(&self, now: DateTime<Utc>, entitlement: Entitlement) -> AnalyticsContext {
        AnalyticsContext {
            now,
            offset: self.utc_offset,
            locale: self.locale,
            entitlement,
        }
    }
}
