//! # Sale Repository
//!
//! Posting a cart as a sale, and reading sales back.
//!
//! ## Commit Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit_sale (ONE transaction)                     │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   │                                                                     │
//! │   ├── INSERT sales (header, totals = Σ cart lines)                     │
//! │   │                                                                     │
//! │   ├── for each cart line:                                              │
//! │   │     UPDATE products SET quantity = quantity - n                    │
//! │   │       WHERE id = ? AND account_id = ? AND quantity >= n            │
//! │   │         │                                                           │
//! │   │         ├── 1 row  → INSERT sale_line_items (cart-time snapshot)   │
//! │   │         └── 0 rows → re-read product                               │
//! │   │                        ├── exists → StockConflict                  │
//! │   │                        └── gone   → NotFound                       │
//! │   │                        (transaction dropped = ROLLBACK)            │
//! │   │                                                                     │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Either the header, every line and every decrement land, or nothing.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukan_core::{CartLine, CustomerInfo, Money, PaymentMethod, Sale, SaleLineItem};

const SELECT_SALE: &str = r#"
    SELECT id, account_id, receipt_number, total_amount_cents, profit_cents,
           payment_method, customer_name, customer_phone, created_at
    FROM sales
"#;

/// Everything needed to post one sale.
#[derive(Debug, Clone)]
pub struct NewSale<'a> {
    pub account_id: &'a str,
    pub lines: &'a [CartLine],
    pub payment_method: PaymentMethod,
    pub customer: CustomerInfo,
    pub created_at: DateTime<Utc>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Posts a sale atomically.
    ///
    /// ## Snapshot Pattern
    /// Line prices and profit come from the cart lines, not from the
    /// current catalog. Only stock is re-checked against the store.
    ///
    /// ## Errors
    /// - `StockConflict` when a line no longer fits the on-hand quantity
    /// - `NotFound` when a product was deleted (or belongs to another account)
    /// - Any storage error; nothing is persisted in every error case
    pub async fn commit_sale(&self, new_sale: &NewSale<'_>) -> DbResult<Sale> {
        if new_sale.lines.is_empty() {
            return Err(DbError::TransactionFailed(
                "sale has no line items".to_string(),
            ));
        }

        let customer = new_sale.customer.clone().normalized();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            account_id: new_sale.account_id.to_string(),
            receipt_number: generate_receipt_number(new_sale.created_at),
            total_amount_cents: new_sale.lines.iter().map(|l| l.subtotal()).sum::<Money>().cents(),
            profit_cents: new_sale.lines.iter().map(|l| l.profit()).sum::<Money>().cents(),
            payment_method: new_sale.payment_method,
            customer_name: customer.name,
            customer_phone: customer.phone,
            created_at: new_sale.created_at,
        };

        debug!(
            id = %sale.id,
            receipt_number = %sale.receipt_number,
            lines = new_sale.lines.len(),
            "Committing sale"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, account_id, receipt_number, total_amount_cents, profit_cents,
                payment_method, customer_name, customer_phone, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.account_id)
        .bind(&sale.receipt_number)
        .bind(sale.total_amount_cents)
        .bind(sale.profit_cents)
        .bind(sale.payment_method)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for line in new_sale.lines {
            let decremented = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - ?, updated_at = ?
                WHERE id = ? AND account_id = ? AND quantity >= ?
                "#,
            )
            .bind(line.quantity)
            .bind(new_sale.created_at)
            .bind(&line.product_id)
            .bind(new_sale.account_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT quantity FROM products WHERE id = ? AND account_id = ?",
                )
                .bind(&line.product_id)
                .bind(new_sale.account_id)
                .fetch_optional(&mut *tx)
                .await?;

                warn!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    available = ?available,
                    "Sale rejected at commit, rolling back"
                );

                return Err(match available {
                    Some(available) => DbError::StockConflict {
                        product_id: line.product_id.clone(),
                        product: line.name.clone(),
                        available,
                        requested: line.quantity,
                    },
                    None => DbError::not_found("Product", &line.product_id),
                });
            }

            sqlx::query(
                r#"
                INSERT INTO sale_line_items (
                    id, sale_id, product_id, name_snapshot, quantity,
                    unit_price_cents, subtotal_cents, profit_cents
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .bind(line.profit_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = %sale.total_amount(),
            profit = %sale.profit(),
            "Sale committed"
        );

        Ok(sale)
    }

    /// Gets a sale by ID, scoped to the account.
    pub async fn get_by_id(&self, account_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE id = ? AND account_id = ?"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, account_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "{SELECT_SALE} WHERE account_id = ? ORDER BY created_at DESC LIMIT ?"
        ))
        .bind(account_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets all line items of a sale.
    pub async fn line_items(&self, sale_id: &str) -> DbResult<Vec<SaleLineItem>> {
        let items = sqlx::query_as::<_, SaleLineItem>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot, quantity,
                   unit_price_cents, subtotal_cents, profit_cents
            FROM sale_line_items
            WHERE sale_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn count(&self, account_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a receipt number in format: `RCP-YYMMDD-HHMMSS-NNNN`
///
/// ## Format
/// - YYMMDD-HHMMSS: Posting time (UTC)
/// - NNNN: Random suffix so two sales in the same second stay distinct
///
/// ## Example
/// `RCP-260315-120000-0042`
pub fn generate_receipt_number(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().as_u128() % 10_000;
    format!("RCP-{}-{:04}", at.format("%y%m%d-%H%M%S"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{test_account, test_db, test_product};
    use crate::Database;
    use chrono::TimeZone;
    use dukan_core::{Cart, SubscriptionTier};

    fn new_sale<'a>(account_id: &'a str, lines: &'a [CartLine]) -> NewSale<'a> {
        NewSale {
            account_id,
            lines,
            payment_method: PaymentMethod::Cash,
            customer: CustomerInfo::default(),
            created_at: Utc::now(),
        }
    }

    async fn quantity_of(db: &Database, account_id: &str, product_id: &str) -> i64 {
        db.products()
            .get_by_id(account_id, product_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[test]
    fn test_receipt_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 15, 9, 5, 7).unwrap();
        let receipt = generate_receipt_number(at);
        assert!(receipt.starts_with("RCP-260315-090507-"));
        assert_eq!(receipt.len(), "RCP-260315-090507-0000".len());
    }

    #[tokio::test]
    async fn test_commit_sale_persists_everything() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "Product A", 10_000, 6_000, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 3).unwrap();

        let sale = db.sales().commit_sale(&new_sale(&account.id, cart.lines())).await.unwrap();
        assert_eq!(sale.total_amount_cents, 30_000);
        assert_eq!(sale.profit_cents, 12_000);
        assert_eq!(sale.total_amount_cents, cart.totals().subtotal_cents);

        assert_eq!(quantity_of(&db, &account.id, &a.id).await, 2);

        let stored = db.sales().get_by_id(&account.id, &sale.id).await.unwrap().unwrap();
        assert_eq!(stored.receipt_number, sale.receipt_number);

        let items = db.sales().line_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id.as_deref(), Some(a.id.as_str()));
        assert_eq!(items[0].name_snapshot, "Product A");
        assert_eq!(items.iter().map(|i| i.subtotal_cents).sum::<i64>(), stored.total_amount_cents);
        assert_eq!(items.iter().map(|i| i.profit_cents).sum::<i64>(), stored.profit_cents);
    }

    #[tokio::test]
    async fn test_commit_uses_cart_prices_not_catalog() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Premium).await;
        let mut a = test_product(&db, &account.id, "A", 100, 60, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 2).unwrap();

        // Price changes after the item went into the cart
        a.selling_price_cents = 999;
        db.products().update(&a).await.unwrap();

        let sale = db.sales().commit_sale(&new_sale(&account.id, cart.lines())).await.unwrap();
        assert_eq!(sale.total_amount_cents, 200);
        assert_eq!(sale.profit_cents, 80);
    }

    #[tokio::test]
    async fn test_stale_cart_rolls_back_everything() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "A", 100, 60, 5).await;
        let b = test_product(&db, &account.id, "B", 200, 100, 2).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 2).unwrap();
        cart.add_item(&b, 2).unwrap();

        // Someone else sells one B first
        let mut other = Cart::new();
        other.add_item(&b, 1).unwrap();
        db.sales().commit_sale(&new_sale(&account.id, other.lines())).await.unwrap();

        let err = db.sales().commit_sale(&new_sale(&account.id, cart.lines())).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::StockConflict {
                available: 1,
                requested: 2,
                ..
            }
        ));

        // A's decrement was rolled back and no second sale exists
        assert_eq!(quantity_of(&db, &account.id, &a.id).await, 5);
        assert_eq!(quantity_of(&db, &account.id, &b.id).await, 1);
        assert_eq!(db.sales().count(&account.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleted_product_fails_commit() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "A", 100, 60, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 1).unwrap();
        db.products().delete(&account.id, &a.id).await.unwrap();

        let err = db.sales().commit_sale(&new_sale(&account.id, cart.lines())).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.sales().count(&account.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cannot_sell_another_accounts_product() {
        let db = test_db().await;
        let owner = test_account(&db, SubscriptionTier::Premium).await;
        let intruder = test_account(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &owner.id, "A", 100, 60, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 1).unwrap();

        let err = db.sales().commit_sale(&new_sale(&intruder.id, cart.lines())).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(quantity_of(&db, &owner.id, &a.id).await, 5);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Free).await;
        assert!(db.sales().commit_sale(&new_sale(&account.id, &[])).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_product_keeps_line_snapshot() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "Old Soap", 100, 60, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 1).unwrap();
        let sale = db.sales().commit_sale(&new_sale(&account.id, cart.lines())).await.unwrap();

        db.products().delete(&account.id, &a.id).await.unwrap();

        let items = db.sales().line_items(&sale.id).await.unwrap();
        assert_eq!(items[0].product_id, None);
        assert_eq!(items[0].name_snapshot, "Old Soap");
    }

    #[tokio::test]
    async fn test_customer_info_normalized() {
        let db = test_db().await;
        let account = test_account(&db, SubscriptionTier::Premium).await;
        let a = test_product(&db, &account.id, "A", 100, 60, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&a, 1).unwrap();
        let mut request = new_sale(&account.id, cart.lines());
        request.payment_method = PaymentMethod::Online;
        request.customer = CustomerInfo {
            name: Some("  ".to_string()),
            phone: Some("0300-1234567".to_string()),
        };

        let sale = db.sales().commit_sale(&request).await.unwrap();
        let stored = db.sales().get_by_id(&account.id, &sale.id).await.unwrap().unwrap();
        assert_eq!(stored.customer_name, None);
        assert_eq!(stored.customer_phone.as_deref(), Some("0300-1234567"));
        assert_eq!(stored.payment_method, PaymentMethod::Online);
    }
}
