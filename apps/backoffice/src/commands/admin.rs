//! # Admin Commands
//!
//! Cross-account figures and coupon management for the platform operator.
//! Every command here reloads the caller's account and checks its role
//! first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{DbState, SessionContext};
use dukan_core::{Account, Coupon, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total_accounts: i64,
    /// Sum of completed subscription charges, minor units.
    pub revenue_cents: i64,
    pub completed_subscriptions: i64,
}

/// Input for a new coupon. The code is stored uppercase.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    pub code: String,
    pub discount_cents: i64,
    pub usage_limit: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,
}

/// ## Errors
/// - `FORBIDDEN` unless the session's account has the admin role
pub async fn admin_summary(
    db: &DbState,
    session: &SessionContext,
) -> Result<AdminSummary, ApiError> {
    let account = require_admin(db, session).await?;
    debug!(account_id = %account.id, "admin_summary command");

    let total_accounts = db.inner().accounts().count().await?;
    let revenue = db.inner().subscriptions().revenue_summary().await?;

    Ok(AdminSummary {
        total_accounts,
        revenue_cents: revenue.revenue_cents,
        completed_subscriptions: revenue.completed_count,
    })
}

/// All coupons ordered by code, inactive ones included.
pub async fn list_coupons(db: &DbState, session: &SessionContext) -> Result<Vec<Coupon>, ApiError> {
    require_admin(db, session).await?;
    Ok(db.inner().coupons().list().await?)
}

/// ## Errors
/// - `VALIDATION_ERROR` for a malformed code, negative discount or a
///   usage limit below 1; also for a code that already exists
pub async fn create_coupon(
    db: &DbState,
    session: &SessionContext,
    input: CouponInput,
) -> Result<Coupon, ApiError> {
    require_admin(db, session).await?;
    debug!(code = %input.code, "create_coupon command");

    let coupon = db
        .inner()
        .coupons()
        .create(
            &input.code,
            Money::from_cents(input.discount_cents),
            input.usage_limit,
            input.expiry_date,
        )
        .await?;

    info!(code = %coupon.code, limit = coupon.usage_limit, "Coupon created");

    Ok(coupon)
}

/// Stops a coupon from validating. Past redemptions are kept.
pub async fn deactivate_coupon(
    db: &DbState,
    session: &SessionContext,
    code: &str,
) -> Result<(), ApiError> {
    require_admin(db, session).await?;
    db.inner().coupons().set_active(code, false).await?;
    info!(code = %code, "Coupon deactivated");
    Ok(())
}

async fn require_admin(db: &DbState, session: &SessionContext) -> Result<Account, ApiError> {
    let account = db.inner().accounts().require(&session.account_id).await?;
    if !account.is_admin() {
        warn!(account_id = %account.id, "Non-admin requested an admin command");
        return Err(ApiError::forbidden());
    }
    Ok(account)
}
