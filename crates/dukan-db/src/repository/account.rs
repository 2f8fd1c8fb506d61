//! # Account Repository
//!
//! Accounts and their subscription state. The subscription columns are
//! only written through [`SubscriptionRepository::change_subscription`]
//! in normal operation; `set_subscription` exists for seeding and tests.
//!
//! [`SubscriptionRepository::change_subscription`]: crate::repository::subscription::SubscriptionRepository::change_subscription

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukan_core::{Account, AccountRole, Locale, SubscriptionTier};

const SELECT_ACCOUNT: &str = r#"
    SELECT id, business_name, subscription_tier, subscription_expiry,
           role, locale, created_at
    FROM accounts
"#;

/// Repository for account database operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Creates a user account with no expiry and English locale.
    pub async fn create(&self, business_name: &str, tier: SubscriptionTier) -> DbResult<Account> {
        let account = Account {
            id: Uuid::new_v4().to_string(),
            business_name: business_name.trim().to_string(),
            subscription_tier: tier,
            subscription_expiry: None,
            role: AccountRole::User,
            locale: Locale::En,
            created_at: Utc::now(),
        };

        self.insert(&account).await?;
        Ok(account)
    }

    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        debug!(id = %account.id, tier = %account.subscription_tier, "Inserting account");

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, business_name, subscription_tier, subscription_expiry,
                role, locale, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.business_name)
        .bind(account.subscription_tier)
        .bind(account.subscription_expiry)
        .bind(account.role)
        .bind(account.locale)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an account by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!("{SELECT_ACCOUNT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing account is an error.
    pub async fn require(&self, id: &str) -> DbResult<Account> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Account", id))
    }

    pub async fn set_locale(&self, id: &str, locale: Locale) -> DbResult<()> {
        let result = sqlx::query("UPDATE accounts SET locale = ? WHERE id = ?")
            .bind(locale)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    pub async fn set_role(&self, id: &str, role: AccountRole) -> DbResult<()> {
        let result = sqlx::query("UPDATE accounts SET role = ? WHERE id = ?")
            .bind(role)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Overwrites tier and expiry without recording a subscription.
    pub async fn set_subscription(
        &self,
        id: &str,
        tier: SubscriptionTier,
        expiry: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET subscription_tier = ?, subscription_expiry = ? WHERE id = ?",
        )
        .bind(tier)
        .bind(expiry)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        Ok(())
    }

    /// Counts all accounts (admin summary, seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = db.accounts().create(" Khan Store ", SubscriptionTier::Standard).await.unwrap();

        let loaded = db.accounts().require(&created.id).await.unwrap();
        assert_eq!(loaded.business_name, "Khan Store");
        assert_eq!(loaded.subscription_tier, SubscriptionTier::Standard);
        assert_eq!(loaded.subscription_expiry, None);
        assert_eq!(loaded.role, AccountRole::User);
        assert_eq!(loaded.locale, Locale::En);
    }

    #[tokio::test]
    async fn test_missing_account() {
        let db = test_db().await;
        assert!(db.accounts().get_by_id("nope").await.unwrap().is_none());
        assert!(matches!(
            db.accounts().require("nope").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_updates() {
        let db = test_db().await;
        let account = db.accounts().create("Shop", SubscriptionTier::Free).await.unwrap();
        let expiry = Utc::now() + Duration::days(30);

        db.accounts().set_locale(&account.id, Locale::Ur).await.unwrap();
        db.accounts().set_role(&account.id, AccountRole::Admin).await.unwrap();
        db.accounts()
            .set_subscription(&account.id, SubscriptionTier::Premium, Some(expiry))
            .await
            .unwrap();

        let loaded = db.accounts().require(&account.id).await.unwrap();
        assert_eq!(loaded.locale, Locale::Ur);
        assert!(loaded.is_admin());
        assert_eq!(loaded.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(loaded.subscription_expiry, Some(expiry));
    }
}
