//! # Analytics Commands
//!
//! Dashboard and windowed reports.
//!
//! Each call reloads the account, resolves its entitlement at `now`, loads
//! the ledger in one read transaction and hands both to the pure
//! aggregation functions in `dukan_core::analytics`.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::resolve_entitlement;
use crate::error::ApiError;
use crate::state::{DbState, SessionContext};
use dukan_core::analytics::{compute_dashboard, compute_report, DashboardMetrics, ReportMetrics, ReportWindow};

pub async fn get_dashboard(
    db: &DbState,
    session: &SessionContext,
    now: DateTime<Utc>,
) -> Result<DashboardMetrics, ApiError> {
    let (_, entitlement) = resolve_entitlement(db, session, now).await?;
    debug!(account_id = %session.account_id, tier = %entitlement.tier, "get_dashboard command");

    let ledger = db.inner().ledger().load(&session.account_id).await?;
    Ok(compute_dashboard(&ledger, &session.analytics_context(now, entitlement)))
}

pub async fn get_report(
    db: &DbState,
    session: &SessionContext,
    window: ReportWindow,
    now: DateTime<Utc>,
) -> Result<ReportMetrics, ApiError> {
    let (_, entitlement) = resolve_entitlement(db, session, now).await?;
    debug!(account_id = %session.account_id, window = %window, "get_report command");

    let ledger = db.inner().ledger().load(&session.account_id).await?;
    Ok(compute_report(&ledger, window, &session.analytics_context(now, entitlement)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{test_db, test_product, test_session};
    use chrono::Duration;
    use dukan_core::{Cart, CustomerInfo, PaymentMethod, Product, SubscriptionTier};
    use dukan_db::NewSale;

    async fn sell(db: &DbState, product: &Product, quantity: i64, at: DateTime<Utc>) {
        let current = db
            .inner()
            .products()
            .get_by_id(&product.account_id, &product.id)
            .await
            .unwrap()
            .unwrap();
        let mut cart = Cart::new();
        cart.add_item(&current, quantity).unwrap();
        db.inner()
            .sales()
            .commit_sale(&NewSale {
                account_id: &product.account_id,
                lines: cart.lines(),
                payment_method: PaymentMethod::Cash,
                customer: CustomerInfo::default(),
                created_at: at,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_ledger_is_all_zero() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Premium).await;

        let dashboard = get_dashboard(&db, &session, Utc::now()).await.unwrap();
        assert_eq!(dashboard, DashboardMetrics::default());

        let report = get_report(&db, &session, ReportWindow::Monthly, Utc::now()).await.unwrap();
        assert_eq!(report.total_sales, 0);
        assert_eq!(report.transaction_count, 0);
        assert!(report.sales_by_date.is_empty());
    }

    #[tokio::test]
    async fn test_active_standard_sees_weekly_sales() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Free).await;
        let now = Utc::now();
        db.inner()
            .accounts()
            .set_subscription(&account.id, SubscriptionTier::Standard, Some(now + Duration::days(20)))
            .await
            .unwrap();

        let rice = test_product(&db, &account.id, "Rice", 200, 150, 50).await;
        sell(&db, &rice, 1, now - Duration::minutes(1)).await;
        sell(&db, &rice, 2, now - Duration::days(2)).await;

        let dashboard = get_dashboard(&db, &session, now).await.unwrap();
        assert!(!dashboard.limited);
        assert_eq!(dashboard.today_sales, 200);
        assert_eq!(dashboard.weekly_sales, 600);
        assert_eq!(dashboard.total_profit, 150);
        assert_eq!(dashboard.top_products[0].units_sold, 3);
    }

    #[tokio::test]
    async fn test_expired_subscription_is_gated_on_next_call() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Free).await;
        let now = Utc::now();
        db.inner()
            .accounts()
            .set_subscription(&account.id, SubscriptionTier::Standard, Some(now + Duration::hours(1)))
            .await
            .unwrap();

        let rice = test_product(&db, &account.id, "Rice", 200, 150, 50).await;
        sell(&db, &rice, 1, now - Duration::minutes(1)).await;
        sell(&db, &rice, 2, now - Duration::days(2)).await;

        assert!(!get_dashboard(&db, &session, now).await.unwrap().limited);

        // Same session, two hours later: the plan has lapsed
        let later = now + Duration::hours(2);
        let dashboard = get_dashboard(&db, &session, later).await.unwrap();
        assert!(dashboard.limited);
        assert_eq!(dashboard.weekly_sales, 0);
        assert_eq!(dashboard.monthly_sales, 0);
        assert_eq!(dashboard.total_profit, 150);

        let report = get_report(&db, &session, ReportWindow::Monthly, later).await.unwrap();
        assert!(report.limited);
        assert!(report.window_start >= later - Duration::days(7));
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let db = test_db().await;
        let (_, mut session) = test_session(&db, SubscriptionTier::Free).await;
        session.account_id = "missing".to_string();

        let err = get_dashboard(&db, &session, Utc::now()).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
    }
}
