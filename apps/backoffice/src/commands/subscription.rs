//! # Subscription Commands
//!
//! The subscription screen: pick a tier, optionally apply a coupon, see
//! the price, confirm.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Subscription Flow                                    │
//! │                                                                         │
//! │  select_tier(premium) ──► PriceQuote { base 500, discount 0, 500 }     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  apply_coupon("eid50")                                                 │
//! │    ├── valid   ──► PriceQuote { base 500, discount 50, final 450 }     │
//! │    └── invalid ──► INVALID_COUPON, session back to base price          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  change_subscription                                                   │
//! │    1. re-validate the coupon at `now`                                  │
//! │    2. ONE transaction: redeem coupon, update account, insert record    │
//! │    3. coupon cleared from the pricing session                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use super::resolve_entitlement;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, PricingState, SessionContext};
use dukan_core::error::CouponError;
use dukan_core::pricing::{validate_coupon, Discount, PriceQuote};
use dukan_core::validation::validate_coupon_code;
use dukan_core::{Coupon, CoreError, Entitlement, SubscriptionRecord, SubscriptionTier};
use dukan_db::{DbError, SubscriptionChange};

/// Result of a confirmed tier change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOutcome {
    pub quote: PriceQuote,
    #[ts(as = "Option<String>")]
    pub expiry: Option<DateTime<Utc>>,
    /// `None` after a downgrade to free.
    pub record: Option<SubscriptionRecord>,
}

/// Current plan of the session's account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub entitlement: Entitlement,
    #[ts(as = "Option<String>")]
    pub expiry: Option<DateTime<Utc>>,
    pub latest_record: Option<SubscriptionRecord>,
}

pub fn get_quote(pricing: &PricingState) -> PriceQuote {
    pricing.with_session(|p| p.quote())
}

/// Selects a tier. An applied coupon is kept; free-tier quotes ignore it.
pub fn select_tier(pricing: &PricingState, tier: SubscriptionTier) -> PriceQuote {
    debug!(tier = %tier, "select_tier command");
    pricing.with_session_mut(|p| {
        p.select_tier(tier);
        p.quote()
    })
}

/// Validates and applies a coupon to the selected tier.
///
/// Re-applying the code that is already applied changes nothing.
///
/// ## Errors
/// - `VALIDATION_ERROR` for a malformed code
/// - `INVALID_COUPON` when the coupon is unknown, inactive, expired,
///   exhausted, or the free tier is selected; any applied coupon is
///   removed so the quote falls back to the base price
pub async fn apply_coupon(
    db: &DbState,
    pricing: &PricingState,
    code: &str,
    now: DateTime<Utc>,
) -> Result<PriceQuote, ApiError> {
    debug!(code = %code, "apply_coupon command");
    validate_coupon_code(code)?;

    let tier = pricing.with_session(|p| p.tier());
    match lookup_discount(db, code, tier, now).await? {
        Ok(discount) => Ok(pricing.with_session_mut(|p| {
            p.apply(discount);
            p.quote()
        })),
        Err(rejected) => {
            pricing.with_session_mut(|p| p.remove_coupon());
            Err(CoreError::InvalidCoupon(rejected).into())
        }
    }
}

pub fn remove_coupon(pricing: &PricingState) -> PriceQuote {
    pricing.with_session_mut(|p| {
        p.remove_coupon();
        p.quote()
    })
}

/// Applies the priced selection to the session's account.
///
/// Paid tiers run for `config.subscription_months` calendar months from
/// `now`; free has no expiry.
pub async fn change_subscription(
    db: &DbState,
    pricing: &PricingState,
    session: &SessionContext,
    config: &ConfigState,
    now: DateTime<Utc>,
) -> Result<SubscriptionOutcome, ApiError> {
    let (tier, applied) = pricing.with_session(|p| (p.tier(), p.applied_coupon().cloned()));
    debug!(account_id = %session.account_id, tier = %tier, "change_subscription command");

    // The coupon may have expired or been deactivated since it was applied
    let discount = match applied.filter(|_| tier.is_paid()) {
        Some(applied) => match lookup_discount(db, &applied.code, tier, now).await? {
            Ok(discount) => Some(discount),
            Err(rejected) => {
                pricing.with_session_mut(|p| p.remove_coupon());
                return Err(CoreError::InvalidCoupon(rejected).into());
            }
        },
        None => None,
    };

    let quote = dukan_core::pricing::quote(tier, discount.as_ref());

    let expiry = if tier.is_paid() {
        let expiry = now
            .checked_add_months(Months::new(config.subscription_months))
            .ok_or_else(|| ApiError::validation("Subscription expiry is out of range"))?;
        Some(expiry)
    } else {
        None
    };

    let change = SubscriptionChange {
        account_id: &session.account_id,
        quote: &quote,
        start: now,
        expiry,
    };

    let record = match db.inner().subscriptions().change_subscription(&change).await {
        Ok(record) => record,
        Err(err) => {
            // Exhausted between validation and commit
            if matches!(err, DbError::Coupon(_)) {
                pricing.with_session_mut(|p| p.remove_coupon());
            }
            return Err(err.into());
        }
    };

    pricing.with_session_mut(|p| p.remove_coupon());

    info!(
        account_id = %session.account_id,
        tier = %tier,
        charged = quote.final_amount,
        "Subscription updated"
    );

    Ok(SubscriptionOutcome {
        quote,
        expiry,
        record,
    })
}

pub async fn subscription_status(
    db: &DbState,
    session: &SessionContext,
    now: DateTime<Utc>,
) -> Result<SubscriptionStatus, ApiError> {
    let (account, entitlement) = resolve_entitlement(db, session, now).await?;
    let latest_record = db.inner().subscriptions().current(&account.id).await?;

    Ok(SubscriptionStatus {
        entitlement,
        expiry: account.subscription_expiry,
        latest_record,
    })
}

/// Every subscription charge recorded for the account, newest first.
pub async fn subscription_history(
    db: &DbState,
    session: &SessionContext,
) -> Result<Vec<SubscriptionRecord>, ApiError> {
    Ok(db.inner().subscriptions().history(&session.account_id).await?)
}

/// Outer error: storage failure. Inner error: the coupon was rejected.
async fn lookup_discount(
    db: &DbState,
    code: &str,
    tier: SubscriptionTier,
    now: DateTime<Utc>,
) -> Result<Result<Discount, CouponError>, ApiError> {
    let coupon = db.inner().coupons().find_by_code(code).await?;

    Ok(match coupon {
        Some(coupon) => validate_coupon(&coupon, tier, now),
        None => Err(CouponError::NotFound(Coupon::normalize_code(code))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{test_db, test_session};
    use crate::error::ErrorCode;
    use chrono::Duration;
    use dukan_core::{Money, PaymentStatus};

    async fn with_coupon(db: &DbState, code: &str, major: i64, limit: i64) {
        db.inner().coupons().create(code, Money::from_major(major), limit, None).await.unwrap();
    }

    #[tokio::test]
    async fn test_quote_with_coupon() {
        let db = test_db().await;
        with_coupon(&db, "EID50", 50, 10).await;
        let pricing = PricingState::new(SubscriptionTier::Premium);

        let base = get_quote(&pricing);
        assert_eq!(base.final_amount, Money::from_major(500).cents());

        let quote = apply_coupon(&db, &pricing, "eid50", Utc::now()).await.unwrap();
        assert_eq!(quote.discount, Money::from_major(50).cents());
        assert_eq!(quote.final_amount, Money::from_major(450).cents());

        // Same code again: no double discount
        let again = apply_coupon(&db, &pricing, "EID50", Utc::now()).await.unwrap();
        assert_eq!(again.final_amount, Money::from_major(450).cents());

        // Free tier ignores the coupon but keeps it for later
        assert_eq!(select_tier(&pricing, SubscriptionTier::Free).final_amount, 0);
        assert_eq!(
            select_tier(&pricing, SubscriptionTier::Standard).final_amount,
            Money::from_major(150).cents()
        );

        assert_eq!(remove_coupon(&pricing).final_amount, Money::from_major(200).cents());
    }

    #[tokio::test]
    async fn test_invalid_coupon_falls_back_to_base_price() {
        let db = test_db().await;
        with_coupon(&db, "EID50", 50, 10).await;
        db.inner()
            .coupons()
            .create("OLD", Money::from_major(30), 10, Some(Utc::now() - Duration::days(1)))
            .await
            .unwrap();
        let pricing = PricingState::new(SubscriptionTier::Standard);

        apply_coupon(&db, &pricing, "EID50", Utc::now()).await.unwrap();

        let err = apply_coupon(&db, &pricing, "OLD", Utc::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCoupon);
        assert_eq!(get_quote(&pricing).final_amount, Money::from_major(200).cents());

        let err = apply_coupon(&db, &pricing, "NOPE", Utc::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCoupon);

        let err = apply_coupon(&db, &pricing, "bad code!", Utc::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_coupon_rejected_on_free_tier() {
        let db = test_db().await;
        with_coupon(&db, "EID50", 50, 10).await;
        let pricing = PricingState::new(SubscriptionTier::Free);

        let err = apply_coupon(&db, &pricing, "EID50", Utc::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCoupon);
    }

    #[tokio::test]
    async fn test_change_subscription_redeems_coupon() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Free).await;
        with_coupon(&db, "EID50", 50, 10).await;
        let config = ConfigState::default();
        let pricing = PricingState::new(SubscriptionTier::Premium);
        let now = Utc::now();

        apply_coupon(&db, &pricing, "EID50", now).await.unwrap();
        let outcome = change_subscription(&db, &pricing, &session, &config, now).await.unwrap();

        assert_eq!(outcome.quote.final_amount, Money::from_major(450).cents());
        assert_eq!(outcome.expiry, now.checked_add_months(Months::new(1)));
        let record = outcome.record.unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Completed);
        assert_eq!(record.coupon_code.as_deref(), Some("EID50"));

        let coupon = db.inner().coupons().find_by_code("EID50").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 1);
        assert!(pricing.with_session(|p| p.applied_coupon().is_none()));

        let status = subscription_status(&db, &session, now).await.unwrap();
        assert_eq!(status.entitlement.tier, SubscriptionTier::Premium);
        assert!(status.entitlement.has_full_access());
        assert_eq!(status.latest_record.unwrap().id, record.id);

        let account = db.inner().accounts().require(&account.id).await.unwrap();
        assert_eq!(account.subscription_expiry, outcome.expiry);
    }

    #[tokio::test]
    async fn test_exhausted_coupon_aborts_change() {
        let db = test_db().await;
        let (_, first) = test_session(&db, SubscriptionTier::Free).await;
        let (second_account, second) = test_session(&db, SubscriptionTier::Free).await;
        with_coupon(&db, "ONCE", 20, 1).await;
        let config = ConfigState::default();
        let now = Utc::now();

        // Both sessions validate the coupon while it still has a use left
        let p1 = PricingState::new(SubscriptionTier::Standard);
        let p2 = PricingState::new(SubscriptionTier::Standard);
        apply_coupon(&db, &p1, "ONCE", now).await.unwrap();
        apply_coupon(&db, &p2, "ONCE", now).await.unwrap();

        change_subscription(&db, &p1, &first, &config, now).await.unwrap();
        let err = change_subscription(&db, &p2, &second, &config, now).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCoupon);

        let account = db.inner().accounts().require(&second_account.id).await.unwrap();
        assert_eq!(account.subscription_tier, SubscriptionTier::Free);
        assert_eq!(get_quote(&p2).final_amount, Money::from_major(200).cents());
    }

    #[tokio::test]
    async fn test_downgrade_to_free() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Standard).await;
        let pricing = PricingState::new(SubscriptionTier::Free);

        let outcome = change_subscription(&db, &pricing, &session, &ConfigState::default(), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.quote.final_amount, 0);
        assert!(outcome.expiry.is_none());
        assert!(outcome.record.is_none());

        let account = db.inner().accounts().require(&account.id).await.unwrap();
        assert_eq!(account.subscription_tier, SubscriptionTier::Free);
        assert!(subscription_history(&db, &session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_lists_each_paid_change() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Free).await;
        let (_, other) = test_session(&db, SubscriptionTier::Free).await;
        let config = ConfigState::default();
        let now = Utc::now();

        let standard = PricingState::new(SubscriptionTier::Standard);
        change_subscription(&db, &standard, &session, &config, now).await.unwrap();
        let premium = PricingState::new(SubscriptionTier::Premium);
        let later = now + Duration::seconds(5);
        change_subscription(&db, &premium, &session, &config, later).await.unwrap();

        let history = subscription_history(&db, &session).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].tier, SubscriptionTier::Premium);
        assert_eq!(history[1].tier, SubscriptionTier::Standard);
        assert_eq!(history[1].amount_cents, Money::from_major(200).cents());

        assert!(subscription_history(&db, &other).await.unwrap().is_empty());
    }
}
