//! # Coupon Repository
//!
//! Coupon lookup and administration. Codes are stored uppercase and looked
//! up case-insensitively by normalizing the input first.
//!
//! Redemption (`used_count + 1`) is not here: it happens inside the
//! subscription-change transaction so a failed change never burns a use.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukan_core::validation::{validate_amount_cents, validate_coupon_code, validate_usage_limit};
use dukan_core::{Coupon, Money};

const SELECT_COUPON: &str = r#"
    SELECT id, code, discount_amount_cents, usage_limit, used_count,
           is_active, expiry_date, created_at
    FROM coupons
"#;

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Creates an active coupon.
    ///
    /// ## Errors
    /// - `Validation` for a malformed code, a negative or oversized
    ///   discount, or a usage limit below 1
    /// - `UniqueViolation` when the (normalized) code already exists
    pub async fn create(
        &self,
        code: &str,
        discount: Money,
        usage_limit: i64,
        expiry_date: Option<DateTime<Utc>>,
    ) -> DbResult<Coupon> {
        validate_coupon_code(code)?;
        validate_amount_cents("discount", discount.cents())?;
        validate_usage_limit(usage_limit)?;

        let coupon = Coupon {
            id: Uuid::new_v4().to_string(),
            code: Coupon::normalize_code(code),
            discount_amount_cents: discount.cents(),
            usage_limit,
            used_count: 0,
            is_active: true,
            expiry_date,
            created_at: Utc::now(),
        };

        debug!(code = %coupon.code, discount = %discount, "Creating coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, discount_amount_cents, usage_limit, used_count,
                is_active, expiry_date, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(coupon.discount_amount_cents)
        .bind(coupon.usage_limit)
        .bind(coupon.used_count)
        .bind(coupon.is_active)
        .bind(coupon.expiry_date)
        .bind(coupon.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &coupon.code),
            other => other,
        })?;

        Ok(coupon)
    }

    /// Finds a coupon by code, ignoring case and surrounding whitespace.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!("{SELECT_COUPON} WHERE code = ?"))
            .bind(Coupon::normalize_code(code))
            .fetch_optional(&self.pool)
            .await?;

        Ok(coupon)
    }

    pub async fn set_active(&self, code: &str, active: bool) -> DbResult<()> {
        let code = Coupon::normalize_code(code);
        let result = sqlx::query("UPDATE coupons SET is_active = ? WHERE code = ?")
            .bind(active)
            .bind(&code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", code));
        }

        Ok(())
    }

    pub async fn list(&self) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!("{SELECT_COUPON} ORDER BY code"))
            .fetch_all(&self.pool)
            .await?;

        Ok(coupons)
    }
}
