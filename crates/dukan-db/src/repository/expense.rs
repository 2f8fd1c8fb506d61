//! # Expense Repository
//!
//! Money spent by the business. Expenses feed the "loss" figure on the
//! dashboard and the windowed expense total on reports. Both totals are
//! folded in memory from rows loaded by the ledger repository.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use dukan_core::Expense;

const SELECT_EXPENSE: &str = r#"
    SELECT id, account_id, description, amount_cents, category,
           expense_date, notes, created_at
    FROM expenses
"#;

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, amount = %expense.amount(), "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, account_id, description, amount_cents, category,
                expense_date, notes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.account_id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(&expense.category)
        .bind(expense.expense_date)
        .bind(&expense.notes)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Newest expense date first.
    pub async fn list(&self, account_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "{SELECT_EXPENSE} WHERE account_id = ? ORDER BY expense_date DESC, created_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    pub async fn delete(&self, account_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND account_id = ?")
            .bind(id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{test_account, test_db};
    use chrono::{NaiveDate, Utc};
    use dukan_core::SubscriptionTier;

    fn expense(account_id: &str, amount: i64, date: NaiveDate) -> Expense {
        Expense {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            description: "Electricity".to_string(),
            amount_cents: amount,
            category: Some("utilities".to_string()),
            expense_date: date,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Free).await;

        db.expenses().insert(&expense(&account.id, 500, date(1))).await.unwrap();
        db.expenses().insert(&expense(&account.id, 700, date(10))).await.unwrap();
        db.expenses().insert(&expense(&account.id, 900, date(20))).await.unwrap();

        let listed = db.expenses().list(&account.id).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].expense_date, date(20));
        assert_eq!(listed.iter().map(|e| e.amount_cents).sum::<i64>(), 2_100);
    }

    #[tokio::test]
    async fn test_delete_scoped_to_account() {
        let db = test_db().await;
        let mine = test_account(&db, SubscriptionTier::Free).await;
        let theirs = test_account(&db, SubscriptionTier::Free).await;
        let e = expense(&mine.id, 500, date(1));
        db.expenses().insert(&e).await.unwrap();

        assert!(db.expenses().delete(&theirs.id, &e.id).await.is_err());
        db.expenses().delete(&mine.id, &e.id).await.unwrap();
        assert!(db.expenses().list(&mine.id).await.unwrap().is_empty());
    }
}
