//! # Subscription Pricing
//!
//! Base tier prices, coupon validation and the final quote.
//!
//! ## Quote Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  select tier ──► base_price(tier)                                       │
//! │                       │                                                 │
//! │  enter code ───► validate_coupon(coupon, tier, now) ──► Discount        │
//! │                       │                      │                          │
//! │                       │                      └─ CouponError ──► quote   │
//! │                       ▼                         stays at base price     │
//! │                 quote(tier, discount)                                   │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │        final = max(0, base − discount)   (free tier ignores coupons)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Coupon lookup and redemption live in dukan-db. Validation here only
//! judges a coupon row that has already been loaded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CouponError;
use crate::money::Money;
use crate::types::{Coupon, SubscriptionTier};

// =============================================================================
// Base Prices
// =============================================================================

/// Monthly list price of a tier.
pub const fn base_price(tier: SubscriptionTier) -> Money {
    match tier {
        SubscriptionTier::Free => Money::from_major(0),
        SubscriptionTier::Standard => Money::from_major(200),
        SubscriptionTier::Premium => Money::from_major(500),
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A validated coupon, ready to be priced in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Uppercase coupon code.
    pub code: String,
    pub amount_cents: i64,
}

impl Discount {
    pub fn new(code: impl AsRef<str>, amount: Money) -> Self {
        Discount {
            code: Coupon::normalize_code(code.as_ref()),
            amount_cents: amount.cents(),
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Judges whether `coupon` may discount a `tier` subscription at `now`.
///
/// ## Rejection Order
/// 1. Free tier (nothing to discount)
/// 2. Inactive
/// 3. Past its expiry
/// 4. `used_count >= usage_limit`
pub fn validate_coupon(
    coupon: &Coupon,
    tier: SubscriptionTier,
    now: DateTime<Utc>,
) -> Result<Discount, CouponError> {
    if !tier.is_paid() {
        return Err(CouponError::FreeTier);
    }

    if !coupon.is_active {
        return Err(CouponError::Inactive(coupon.code.clone()));
    }

    if coupon.expiry_date.map_or(false, |expiry| expiry < now) {
        return Err(CouponError::Expired(coupon.code.clone()));
    }

    if coupon.used_count >= coupon.usage_limit {
        return Err(CouponError::UsageLimitReached(coupon.code.clone()));
    }

    Ok(Discount::new(&coupon.code, coupon.discount_amount()))
}

// =============================================================================
// Price Quote
// =============================================================================

/// What the customer would be charged. All amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub tier: SubscriptionTier,
    pub base_amount: i64,
    /// Discount actually taken off; never more than `base_amount`.
    pub discount: i64,
    pub final_amount: i64,
    /// Code of the coupon priced in, if any.
    pub coupon_code: Option<String>,
}

impl PriceQuote {
    #[inline]
    pub fn final_price(&self) -> Money {
        Money::from_cents(self.final_amount)
    }
}

/// Prices `tier` with an optional discount.
///
/// ## Example
/// ```rust
/// use dukan_core::money::Money;
/// use dukan_core::pricing::{quote, Discount};
/// use dukan_core::SubscriptionTier;
///
/// let q = quote(SubscriptionTier::Premium, Some(&Discount::new("eid", Money::from_major(50))));
/// assert_eq!(q.final_amount, Money::from_major(450).cents());
///
/// // Free tier ignores coupons entirely
/// let q = quote(SubscriptionTier::Free, Some(&Discount::new("eid", Money::from_major(50))));
/// assert_eq!(q.final_amount, 0);
/// assert_eq!(q.coupon_code, None);
/// ```
pub fn quote(tier: SubscriptionTier, discount: Option<&Discount>) -> PriceQuote {
    let base = base_price(tier);
    let discount = discount.filter(|_| tier.is_paid());

    let final_price = match discount {
        Some(d) => base.saturating_discount(d.amount()),
        None => base,
    };

    PriceQuote {
        tier,
        base_amount: base.cents(),
        discount: (base - final_price).cents(),
        final_amount: final_price.cents(),
        coupon_code: discount.map(|d| d.code.clone()),
    }
}

// =============================================================================
// Pricing Session
// =============================================================================

/// Tier selection plus at most one applied coupon.
///
/// Mirrors the subscription screen: the user picks a tier, optionally
/// applies a code, and may switch tiers afterwards without losing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSession {
    tier: SubscriptionTier,
    applied: Option<Discount>,
}

impl PricingSession {
    pub fn new(tier: SubscriptionTier) -> Self {
        PricingSession {
            tier,
            applied: None,
        }
    }

    pub fn tier(&self) -> SubscriptionTier {
        self.tier
    }

    pub fn applied_coupon(&self) -> Option<&Discount> {
        self.applied.as_ref()
    }

    /// Changes the selected tier. An applied coupon is kept.
    pub fn select_tier(&mut self, tier: SubscriptionTier) {
        self.tier = tier;
    }

    /// Applies `discount`. Returns `false` when the same code is already
    /// applied; a different code replaces the current one.
    pub fn apply(&mut self, discount: Discount) -> bool {
        if self.applied.as_ref().map(|d| &d.code) == Some(&discount.code) {
            return false;
        }
        self.applied = Some(discount);
        true
    }

    pub fn remove_coupon(&mut self) -> Option<Discount> {
        self.applied.take()
    }

    pub fn quote(&self) -> PriceQuote {
        quote(self.tier, self.applied.as_ref())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
