//! # Subscription Repository
//!
//! Applying a priced tier change and reading subscription history.
//!
//! ## Change Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                change_subscription (ONE transaction)                    │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── coupon priced in?                                                │
//! │   │     UPDATE coupons SET used_count = used_count + 1                 │
//! │   │       WHERE code = ? AND is_active = 1 AND used_count < usage_limit│
//! │   │     0 rows → UsageLimitReached, ROLLBACK                           │
//! │   ├── UPDATE accounts SET subscription_tier, subscription_expiry       │
//! │   └── paid tier? INSERT subscriptions (payment_status = completed)     │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two accounts racing for the last use of a coupon cannot both win: the
//! conditional increment is the single point of truth for `used_count`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukan_core::error::CouponError;
use dukan_core::pricing::PriceQuote;
use dukan_core::{PaymentStatus, SubscriptionRecord};

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, account_id, tier, amount_cents, coupon_code, payment_status,
           start_date, expiry_date, created_at
    FROM subscriptions
"#;

/// A priced tier change ready to be applied.
#[derive(Debug, Clone)]
pub struct SubscriptionChange<'a> {
    pub account_id: &'a str,
    pub quote: &'a PriceQuote,
    pub start: DateTime<Utc>,
    /// `None` for the free tier.
    pub expiry: Option<DateTime<Utc>>,
}

/// Completed-subscription revenue across all accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub completed_count: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    /// Applies a tier change atomically.
    ///
    /// Returns the inserted record for paid tiers, `None` for a downgrade
    /// to free.
    pub async fn change_subscription(
        &self,
        change: &SubscriptionChange<'_>,
    ) -> DbResult<Option<SubscriptionRecord>> {
        let quote = change.quote;
        let tier = quote.tier;

        debug!(
            account_id = %change.account_id,
            tier = %tier,
            amount = quote.final_amount,
            coupon = ?quote.coupon_code,
            "Changing subscription"
        );

        let mut tx = self.pool.begin().await?;

        if let Some(code) = &quote.coupon_code {
            let redeemed = sqlx::query(
                r#"
                UPDATE coupons SET used_count = used_count + 1
                WHERE code = ? AND is_active = 1 AND used_count < usage_limit
                "#,
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;

            if redeemed.rows_affected() == 0 {
                warn!(code = %code, "Coupon could not be redeemed, rolling back");
                return Err(CouponError::UsageLimitReached(code.clone()).into());
            }
        }

        let updated = sqlx::query(
            "UPDATE accounts SET subscription_tier = ?, subscription_expiry = ? WHERE id = ?",
        )
        .bind(tier)
        .bind(change.expiry)
        .bind(change.account_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("Account", change.account_id));
        }

        let record = match (tier.is_paid(), change.expiry) {
            (true, Some(expiry)) => {
                let record = SubscriptionRecord {
                    id: Uuid::new_v4().to_string(),
                    account_id: change.account_id.to_string(),
                    tier,
                    amount_cents: quote.final_amount,
                    coupon_code: quote.coupon_code.clone(),
                    payment_status: PaymentStatus::Completed,
                    start_date: change.start,
                    expiry_date: expiry,
                    created_at: change.start,
                };

                sqlx::query(
                    r#"
                    INSERT INTO subscriptions (
                        id, account_id, tier, amount_cents, coupon_code,
                        payment_status, start_date, expiry_date, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&record.id)
                .bind(&record.account_id)
                .bind(record.tier)
                .bind(record.amount_cents)
                .bind(&record.coupon_code)
                .bind(record.payment_status)
                .bind(record.start_date)
                .bind(record.expiry_date)
                .bind(record.created_at)
                .execute(&mut *tx)
                .await?;

                Some(record)
            }
            (true, None) => {
                return Err(DbError::TransactionFailed(
                    "paid subscription requires an expiry date".to_string(),
                ));
            }
            (false, _) => None,
        };

        tx.commit().await?;

        info!(
            account_id = %change.account_id,
            tier = %tier,
            amount = quote.final_amount,
            "Subscription changed"
        );

        Ok(record)
    }

    /// The most recently created record of an account.
    pub async fn current(&self, account_id: &str) -> DbResult<Option<SubscriptionRecord>> {
        let record = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "{SELECT_SUBSCRIPTION} WHERE account_id = ? ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Newest first.
    pub async fn history(&self, account_id: &str) -> DbResult<Vec<SubscriptionRecord>> {
        let records = sqlx::query_as::<_, SubscriptionRecord>(&format!(
            "{SELECT_SUBSCRIPTION} WHERE account_id = ? ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Revenue from completed records of every account.
    pub async fn revenue_summary(&self) -> DbResult<RevenueSummary> {
        let (completed_count, revenue_cents): (i64, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), SUM(amount_cents) FROM subscriptions WHERE payment_status = ?",
        )
        .bind(PaymentStatus::Completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(RevenueSummary {
            completed_count,
            revenue_cents: revenue_cents.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{test_account, test_db};
    use chrono::Duration;
    use dukan_core::pricing::{quote, Discount};
    use dukan_core::{Money, SubscriptionTier};

    #[tokio::test]
    async fn test_upgrade_with_coupon() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Free).await;
        db.coupons().create("EID50", Money::from_major(50), 2, None).await.unwrap();

        let now = Utc::now();
        let priced = quote(
            SubscriptionTier::Premium,
            Some(&Discount::new("EID50", Money::from_major(50))),
        );
        let change = SubscriptionChange {
            account_id: &account.id,
            quote: &priced,
            start: now,
            expiry: Some(now + Duration::days(30)),
        };

        let record = db.subscriptions().change_subscription(&change).await.unwrap().unwrap();
        assert_eq!(record.amount_cents, Money::from_major(450).cents());
        assert_eq!(record.coupon_code.as_deref(), Some("EID50"));
        assert_eq!(record.payment_status, PaymentStatus::Completed);

        let account = db.accounts().require(&account.id).await.unwrap();
        assert_eq!(account.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(account.subscription_expiry, Some(now + Duration::days(30)));

        let coupon = db.coupons().find_by_code("EID50").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 1);

        let current = db.subscriptions().current(&account.id).await.unwrap().unwrap();
        assert_eq!(current.id, record.id);
    }

    #[tokio::test]
    async fn test_exhausted_coupon_aborts_whole_change() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Free).await;
        db.coupons().create("ONCE", Money::from_major(20), 1, None).await.unwrap();

        let now = Utc::now();
        let priced = quote(
            SubscriptionTier::Standard,
            Some(&Discount::new("ONCE", Money::from_major(20))),
        );
        let change = SubscriptionChange {
            account_id: &account.id,
            quote: &priced,
            start: now,
            expiry: Some(now + Duration::days(30)),
        };

        db.subscriptions().change_subscription(&change).await.unwrap();

        let other = test_account(&db, SubscriptionTier::Free).await;
        let change = SubscriptionChange {
            account_id: &other.id,
            ..change
        };
        let err = db.subscriptions().change_subscription(&change).await.unwrap_err();
        assert!(matches!(err, DbError::Coupon(CouponError::UsageLimitReached(_))));

        // Nothing changed for the second account
        let other = db.accounts().require(&other.id).await.unwrap();
        assert_eq!(other.subscription_tier, SubscriptionTier::Free);
        assert!(db.subscriptions().history(&other.id).await.unwrap().is_empty());

        let coupon = db.coupons().find_by_code("ONCE").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 1);
    }

    #[tokio::test]
    async fn test_downgrade_to_free_records_nothing() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Standard).await;

        let priced = quote(SubscriptionTier::Free, None);
        let change = SubscriptionChange {
            account_id: &account.id,
            quote: &priced,
            start: Utc::now(),
            expiry: None,
        };

        assert!(db.subscriptions().change_subscription(&change).await.unwrap().is_none());
        let account = db.accounts().require(&account.id).await.unwrap();
        assert_eq!(account.subscription_tier, SubscriptionTier::Free);
        assert!(db.subscriptions().current(&account.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revenue_summary() {
        let db = test_db().await;
        assert_eq!(db.subscriptions().revenue_summary().await.unwrap(), RevenueSummary::default());

        let now = Utc::now();
        for tier in [SubscriptionTier::Standard, SubscriptionTier::Premium] {
            let account = test_account(&db, SubscriptionTier::Free).await;
            let priced = quote(tier, None);
            db.subscriptions()
                .change_subscription(&SubscriptionChange {
                    account_id: &account.id,
                    quote: &priced,
                    start: now,
                    expiry: Some(now + Duration::days(30)),
                })
                .await
                .unwrap();
        }

        let summary = db.subscriptions().revenue_summary().await.unwrap();
        assert_eq!(summary.completed_count, 2);
        assert_eq!(summary.revenue_cents, Money::from_major(700).cents());
    }
}
