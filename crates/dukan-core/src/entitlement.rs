//! # Entitlement Resolver
//!
//! Answers "can this account do X" from the account's subscription state.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tier      expiry          is_expired   full access   product limit    │
//! │  ───────   ─────────────   ──────────   ───────────   ─────────────    │
//! │  free      (ignored)       false        NO            10               │
//! │  standard  none / future   false        YES           500              │
//! │  standard  past            true         NO            500              │
//! │  premium   none / future   false        YES           unbounded        │
//! │  premium   past            true         NO            unbounded        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Degraded accounts (no full access) still see today's sales, profit,
//! loss and low stock. Weekly and monthly sales are suppressed and reports
//! are limited to the last [`DEGRADED_ANALYTICS_DAYS`] days.
//!
//! Expiry is time-dependent, so the entitlement is a pure function of
//! `(account, now)` and must be resolved again on every call.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Account, SubscriptionTier};

/// Product cap for the free tier.
pub const FREE_PRODUCT_LIMIT: u32 = 10;

/// Product cap for the standard tier.
pub const STANDARD_PRODUCT_LIMIT: u32 = 500;

/// Report look-back available without full access.
pub const DEGRADED_ANALYTICS_DAYS: i64 = 7;

/// Resolved permissions and limits of an account at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub tier: SubscriptionTier,
    pub is_expired: bool,
    /// `None` means unbounded.
    pub product_limit: Option<u32>,
    /// Maximum report look-back in days; `None` means unrestricted.
    pub analytics_window_days: Option<i64>,
}

impl Entitlement {
    /// Resolves the entitlement of `account` as of `now`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use dukan_core::{Account, AccountRole, Entitlement, Locale, SubscriptionTier};
    ///
    /// let now = Utc::now();
    /// let account = Account {
    ///     id: "acc-1".into(),
    ///     business_name: "Khan General Store".into(),
    ///     subscription_tier: SubscriptionTier::Standard,
    ///     subscription_expiry: Some(now - Duration::days(1)),
    ///     role: AccountRole::User,
    ///     locale: Locale::En,
    ///     created_at: now,
    /// };
    ///
    /// let entitlement = Entitlement::resolve(&account, now);
    /// assert!(entitlement.is_expired);
    /// assert!(!entitlement.has_full_access());
    /// ```
    pub fn resolve(account: &Account, now: DateTime<Utc>) -> Self {
        Self::for_tier(account.subscription_tier, account.subscription_expiry, now)
    }

    /// Resolves from raw subscription state.
    pub fn for_tier(
        tier: SubscriptionTier,
        expiry: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let is_expired = tier.is_paid() && expiry.map_or(false, |expiry| expiry < now);

        let product_limit = match tier {
            SubscriptionTier::Free => Some(FREE_PRODUCT_LIMIT),
            SubscriptionTier::Standard => Some(STANDARD_PRODUCT_LIMIT),
            SubscriptionTier::Premium => None,
        };

        let full_access = tier.is_paid() && !is_expired;

        Entitlement {
            tier,
            is_expired,
            product_limit,
            analytics_window_days: if full_access {
                None
            } else {
                Some(DEGRADED_ANALYTICS_DAYS)
            },
        }
    }

    /// Paid tier that has not expired.
    #[inline]
    pub fn has_full_access(&self) -> bool {
        self.tier.is_paid() && !self.is_expired
    }

    /// Whether one more product fits under the plan's cap.
    pub fn can_add_product(&self, current_count: i64) -> bool {
        match self.product_limit {
            Some(limit) => current_count < i64::from(limit),
            None => true,
        }
    }

    /// Clamps a report window start to the allowed look-back.
    pub fn clamp_window_start(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.analytics_window_days {
            Some(days) => start.max(now - Duration::days(days)),
            None => start,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
