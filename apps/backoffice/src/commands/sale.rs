//! # Sale Commands
//!
//! Turning the session cart into a committed sale.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        commit_sale                                      │
//! │                                                                         │
//! │  1. Snapshot cart lines (lock released immediately)                    │
//! │  2. Empty? ─────────────────────────────► VALIDATION_ERROR             │
//! │  3. SaleRepository::commit_sale  (ONE transaction)                     │
//! │        ├── stock gone?   ──────────────► OUT_OF_STOCK, nothing written │
//! │        ├── product gone? ──────────────► NOT_FOUND, nothing written    │
//! │        ├── store down?   ──────────────► PERSISTENCE_UNAVAILABLE       │
//! │        └── other failure ──────────────► SALE_CREATION_FAILED          │
//! │  4. Clear the cart, return SaleReceipt                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed commit leaves the cart as it was so the cashier can fix the
//! offending line and retry.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{CartState, DbState, SessionContext};
use dukan_core::{CustomerInfo, PaymentMethod, Sale, SaleLineItem};
use dukan_db::NewSale;

/// What the cashier sees after a successful checkout. Amounts in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub receipt_number: String,
    pub total_amount: i64,
    pub total_profit: i64,
}

impl From<&Sale> for SaleReceipt {
    fn from(sale: &Sale) -> Self {
        SaleReceipt {
            receipt_number: sale.receipt_number.clone(),
            total_amount: sale.total_amount_cents,
            total_profit: sale.profit_cents,
        }
    }
}

/// A stored sale with its line items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleLineItem>,
}

/// Commits the session cart as one sale.
pub async fn commit_sale(
    db: &DbState,
    cart: &CartState,
    session: &SessionContext,
    payment_method: PaymentMethod,
    customer: CustomerInfo,
) -> Result<SaleReceipt, ApiError> {
    let lines = cart.with_cart(|c| c.lines().to_vec());
    debug!(lines = lines.len(), method = ?payment_method, "commit_sale command");

    if lines.is_empty() {
        return Err(ApiError::validation("Cart is empty"));
    }

    let new_sale = NewSale {
        account_id: &session.account_id,
        lines: &lines,
        payment_method,
        customer,
        created_at: Utc::now(),
    };

    let sale = db
        .inner()
        .sales()
        .commit_sale(&new_sale)
        .await
        .map_err(ApiError::from_commit)?;

    cart.with_cart_mut(|c| c.clear());

    info!(receipt_number = %sale.receipt_number, "Checkout complete");

    Ok(SaleReceipt::from(&sale))
}

pub async fn get_sale(
    db: &DbState,
    session: &SessionContext,
    sale_id: &str,
) -> Result<SaleDetail, ApiError> {
    let sale = db
        .inner()
        .sales()
        .get_by_id(&session.account_id, sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))?;

    let items = db.inner().sales().line_items(&sale.id).await?;

    Ok(SaleDetail { sale, items })
}

/// Most recent sales first.
pub async fn list_recent_sales(
    db: &DbState,
    session: &SessionContext,
    limit: Option<u32>,
) -> Result<Vec<Sale>, ApiError> {
    let limit = limit.unwrap_or(20).clamp(1, 200);
    Ok(db.inner().sales().list_recent(&session.account_id, limit).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, CartView};
    use crate::commands::test_support::{test_db, test_product, test_session};
    use crate::error::ErrorCode;
    use dukan_core::SubscriptionTier;

    async fn quantity_of(db: &DbState, session: &SessionContext, product_id: &str) -> i64 {
        db.inner()
            .products()
            .get_by_id(&session.account_id, product_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn test_product_a_checkout() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "Product A", 10_000, 6_000, 5).await;
        let b = test_product(&db, &account.id, "Product B", 4_000, 2_500, 7).await;
        let cart = CartState::new();

        add_to_cart(&db, &cart, &session, &a.id, 3).await.unwrap();

        // 3 + 3 exceeds the 5 in stock; the line keeps its 3
        let err = add_to_cart(&db, &cart, &session, &a.id, 3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OutOfStock);
        let view = cart.with_cart(|c| CartView::from(c));
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 3);
        assert_eq!(view.totals.subtotal_cents, 30_000);
        assert_eq!(view.totals.profit_cents, 12_000);

        let receipt = commit_sale(&db, &cart, &session, PaymentMethod::Cash, CustomerInfo::default())
            .await
            .unwrap();

        assert_eq!(receipt.total_amount, 30_000);
        assert_eq!(receipt.total_profit, 12_000);
        assert!(receipt.receipt_number.starts_with("RCP-"));
        assert_eq!(quantity_of(&db, &session, &a.id).await, 2);
        assert_eq!(quantity_of(&db, &session, &b.id).await, 7);
        assert!(cart.with_cart(|c| c.is_empty()));

        let recent = list_recent_sales(&db, &session, None).await.unwrap();
        assert_eq!(recent.len(), 1);
        let detail = get_sale(&db, &session, &recent[0].id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;
        let (_, session) = test_session(&db, SubscriptionTier::Free).await;
        let cart = CartState::new();

        let err = commit_sale(&db, &cart, &session, PaymentMethod::Cash, CustomerInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_concurrent_stale_carts_sell_stock_once() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "Product A", 100, 60, 5).await;

        // Two cashiers build carts from the same stock snapshot
        let first = CartState::new();
        let second = CartState::new();
        add_to_cart(&db, &first, &session, &a.id, 3).await.unwrap();
        add_to_cart(&db, &second, &session, &a.id, 3).await.unwrap();

        let (r1, r2) = tokio::join!(
            commit_sale(&db, &first, &session, PaymentMethod::Cash, CustomerInfo::default()),
            commit_sale(&db, &second, &session, PaymentMethod::Card, CustomerInfo::default()),
        );

        let outcomes = [r1, r2];
        let committed = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(committed, 1);

        let failed = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert_eq!(failed.code, ErrorCode::OutOfStock);

        assert_eq!(quantity_of(&db, &session, &a.id).await, 2);
        assert_eq!(db.inner().sales().count(&account.id).await.unwrap(), 1);

        // The losing cart is kept for a retry
        let kept = [&first, &second]
            .iter()
            .filter(|c| !c.with_cart(|c| c.is_empty()))
            .count();
        assert_eq!(kept, 1);
    }

    #[tokio::test]
    async fn test_deleted_product_fails_commit() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "Product A", 100, 60, 5).await;
        let cart = CartState::new();

        add_to_cart(&db, &cart, &session, &a.id, 1).await.unwrap();
        db.inner().products().delete(&account.id, &a.id).await.unwrap();

        let err = commit_sale(&db, &cart, &session, PaymentMethod::Cash, CustomerInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(db.inner().sales().count(&account.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_store_reports_unavailable() {
        let db = test_db().await;
        let (account, session) = test_session(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "Product A", 100, 60, 5).await;
        let cart = CartState::new();
        add_to_cart(&db, &cart, &session, &a.id, 1).await.unwrap();

        db.inner().close().await;

        let err = commit_sale(&db, &cart, &session, PaymentMethod::Cash, CustomerInfo::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceUnavailable);
        assert!(!cart.with_cart(|c| c.is_empty()));
    }
}
