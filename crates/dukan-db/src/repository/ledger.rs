//! # Ledger Repository
//!
//! Bulk reads that feed the aggregation engine in `dukan_core::analytics`.
//!
//! The four reads run inside one read transaction so the dashboard never
//! sees a sale whose line items have not been loaded yet.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use dukan_core::analytics::LedgerData;
use dukan_core::{Expense, Product, Sale, SaleLineItem};

#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Loads every sale, line item, product and expense of an account.
    pub async fn load(&self, account_id: &str) -> DbResult<LedgerData> {
        let mut tx = self.pool.begin().await?;

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, account_id, receipt_number, total_amount_cents, profit_cents,
                   payment_method, customer_name, customer_phone, created_at
            FROM sales
            WHERE account_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        let line_items = sqlx::query_as::<_, SaleLineItem>(
            r#"
            SELECT li.id, li.sale_id, li.product_id, li.name_snapshot, li.quantity,
                   li.unit_price_cents, li.subtotal_cents, li.profit_cents
            FROM sale_line_items li
            JOIN sales s ON s.id = li.sale_id
            WHERE s.account_id = ?
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, account_id, name_en, name_ur, name_ps,
                   purchase_price_cents, selling_price_cents, quantity, unit,
                   category, low_stock_threshold, created_at, updated_at
            FROM products
            WHERE account_id = ?
            ORDER BY name_en COLLATE NOCASE, id
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, account_id, description, amount_cents, category,
                   expense_date, notes, created_at
            FROM expenses
            WHERE account_id = ?
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            account_id = %account_id,
            sales = sales.len(),
            line_items = line_items.len(),
            products = products.len(),
            expenses = expenses.len(),
            "Ledger loaded"
        );

        Ok(LedgerData {
            sales,
            line_items,
            products,
            expenses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sale::NewSale;
    use crate::repository::test_support::{test_account, test_db, test_product};
    use chrono::Utc;
    use dukan_core::{Cart, CustomerInfo, PaymentMethod, SubscriptionTier};

    #[tokio::test]
    async fn test_load_is_scoped_to_account() {
        let db = test_db().await;
        let mine = test_account(&db, SubscriptionTier::Premium).await;
        let theirs = test_account(&db, SubscriptionTier::Premium).await;

        let rice = test_product(&db, &mine.id, "Rice", 200, 150, 10).await;
        let tea = test_product(&db, &theirs.id, "Tea", 100, 50, 10).await;

        for (account, product) in [(&mine, &rice), (&theirs, &tea)] {
            let mut cart = Cart::new();
            cart.add_item(product, 2).unwrap();
            db.sales()
                .commit_sale(&NewSale {
                    account_id: &account.id,
                    lines: cart.lines(),
                    payment_method: PaymentMethod::Cash,
                    customer: CustomerInfo::default(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let ledger = db.ledger().load(&mine.id).await.unwrap();
        assert_eq!(ledger.sales.len(), 1);
        assert_eq!(ledger.line_items.len(), 1);
        assert_eq!(ledger.line_items[0].product_id.as_deref(), Some(rice.id.as_str()));
        assert_eq!(ledger.products.len(), 1);
        assert_eq!(ledger.products[0].quantity, 8);
        assert!(ledger.expenses.is_empty());
    }

    #[tokio::test]
    async fn test_empty_account_loads_empty_ledger() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Free).await;

        let ledger = db.ledger().load(&account.id).await.unwrap();
        assert!(ledger.sales.is_empty());
        assert!(ledger.line_items.is_empty());
        assert!(ledger.products.is_empty());
    }
}
