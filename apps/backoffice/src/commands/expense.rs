//! # Expense Commands
//!
//! Expenses are recorded against a local calendar date and feed the
//! dashboard's lifetime loss and each report's windowed expense total.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::{DbState, SessionContext};
use dukan_core::validation::{validate_amount_cents, validate_expense_description};
use dukan_core::Expense;

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewExpenseInput {
    pub description: String,
    pub amount_cents: i64,
    pub category: Option<String>,
    /// Defaults to the session's local date at `now`.
    #[ts(as = "Option<String>")]
    pub expense_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

pub async fn record_expense(
    db: &DbState,
    session: &SessionContext,
    input: NewExpenseInput,
    now: DateTime<Utc>,
) -> Result<Expense, ApiError> {
    debug!(amount_cents = %input.amount_cents, "record_expense command");

    validate_expense_description(&input.description)?;
    validate_amount_cents("amount", input.amount_cents)?;

    let expense = Expense {
        id: Uuid::new_v4().to_string(),
        account_id: session.account_id.clone(),
        description: input.description.trim().to_string(),
        amount_cents: input.amount_cents,
        category: input.category.filter(|c| !c.trim().is_empty()),
        expense_date: input
            .expense_date
            .unwrap_or_else(|| now.with_timezone(&session.utc_offset).date_naive()),
        notes: input.notes.filter(|n| !n.trim().is_empty()),
        created_at: now,
    };

    db.inner().expenses().insert(&expense).await?;

    info!(id = %expense.id, amount = %expense.amount(), "Expense recorded");

    Ok(expense)
}

/// Newest expense date first.
pub async fn list_expenses(
    db: &DbState,
    session: &SessionContext,
) -> Result<Vec<Expense>, ApiError> {
    Ok(db.inner().expenses().list(&session.account_id).await?)
}

/// Deletes one of the session account's expenses.
pub async fn delete_expense(
    db: &DbState,
    session: &SessionContext,
    expense_id: &str,
) -> Result<(), ApiError> {
    debug!(expense_id = %expense_id, "delete_expense command");
    db.inner().expenses().delete(&session.account_id, expense_id).await?;
    info!(expense_id = %expense_id, "Expense deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::analytics::get_dashboard;
    use crate::commands::test_support::{test_db, test_session};
    use crate::error::ErrorCode;
    use chrono::TimeZone;
    use dukan_core::SubscriptionTier;

    #[tokio::test]
    async fn test_record_and_list() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Free).await;

        let older = NewExpenseInput {
            description: "Shop rent".to_string(),
            amount_cents: 1_500_000,
            expense_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            ..Default::default()
        };
        record_expense(&db, &session, older, Utc::now()).await.unwrap();

        let newer = NewExpenseInput {
            description: "Electricity".to_string(),
            amount_cents: 350_000,
            category: Some("utilities".to_string()),
            expense_date: NaiveDate::from_ymd_opt(2026, 2, 1),
            ..Default::default()
        };
        record_expense(&db, &session, newer, Utc::now()).await.unwrap();

        let listed = list_expenses(&db, &session).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].description, "Electricity");

        let dashboard = get_dashboard(&db, &session, Utc::now()).await.unwrap();
        assert_eq!(dashboard.total_loss, 1_850_000);
    }

    #[tokio::test]
    async fn test_date_defaults_to_local_day() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Free).await;

        // 21:00 UTC is already the next day at +05:00
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 21, 0, 0).unwrap();
        let input = NewExpenseInput {
            description: "Tea for staff".to_string(),
            amount_cents: 20_000,
            ..Default::default()
        };
        let expense = record_expense(&db, &session, input, now).await.unwrap();

        assert_eq!(expense.expense_date, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
    }

    #[tokio::test]
    async fn test_delete_expense_updates_loss() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Free).await;
        let (_, other) = test_session(&db, SubscriptionTier::Free).await;

        let rent = NewExpenseInput {
            description: "Shop rent".to_string(),
            amount_cents: 1_500_000,
            ..Default::default()
        };
        let rent = record_expense(&db, &session, rent, Utc::now()).await.unwrap();

        let err = delete_expense(&db, &other, &rent.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        delete_expense(&db, &session, &rent.id).await.unwrap();
        assert!(list_expenses(&db, &session).await.unwrap().is_empty());

        let dashboard = get_dashboard(&db, &session, Utc::now()).await.unwrap();
        assert_eq!(dashboard.total_loss, 0);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Free).await;

        let blank = NewExpenseInput {
            description: " ".to_string(),
            amount_cents: 100,
            ..Default::default()
        };
        let err = record_expense(&db, &session, blank, Utc::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let negative = NewExpenseInput {
            description: "Refund".to_string(),
            amount_cents: -100,
            ..Default::default()
        };
        let err = record_expense(&db, &session, negative, Utc::now()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(list_expenses(&db, &session).await.unwrap().is_empty());
    }
}
