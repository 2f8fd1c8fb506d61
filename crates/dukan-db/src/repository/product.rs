//! # Product Repository
//!
//! Catalog reads and writes for one account.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write back                                   │
//! │     SELECT quantity ...;  UPDATE products SET quantity = 2 ...         │
//! │     Two concurrent sales both read 5 and both write 2.                 │
//! │                                                                         │
//! │  ✅ CORRECT: relative update in SQL                                    │
//! │     restock:  SET quantity = quantity + ?                              │
//! │     sale:     SET quantity = quantity - ? WHERE quantity >= ?          │
//! │               (inside the sale transaction, see sale.rs)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukan_core::Product;

const SELECT_PRODUCT: &str = r#"
    SELECT id, account_id, name_en, name_ur, name_ps,
           purchase_price_cents, selling_price_cents, quantity, unit,
           category, low_stock_threshold, created_at, updated_at
    FROM products
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let catalog = repo.list(&account_id, Some(10)).await?;
/// let product = repo.get_by_id(&account_id, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists an account's products ordered by English name.
    ///
    /// `limit = None` returns everything.
    pub async fn list(&self, account_id: &str, limit: Option<u32>) -> DbResult<Vec<Product>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, i64::from);

        debug!(account_id = %account_id, limit = %limit, "Listing products");

        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE account_id = ? ORDER BY name_en COLLATE NOCASE, id LIMIT ?"
        ))
        .bind(account_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID, scoped to the account.
    pub async fn get_by_id(&self, account_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE id = ? AND account_id = ?"
        ))
        .bind(id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Products at or below their low-stock threshold.
    pub async fn low_stock(&self, account_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE account_id = ? AND quantity <= low_stock_threshold ORDER BY quantity, name_en"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product (id generated beforehand).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name_en, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, account_id, name_en, name_ur, name_ps,
                purchase_price_cents, selling_price_cents, quantity, unit,
                category, low_stock_threshold, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.account_id)
        .bind(&product.name_en)
        .bind(&product.name_ur)
        .bind(&product.name_ps)
        .bind(product.purchase_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(&product.category)
        .bind(product.low_stock_threshold)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates names, prices, stock and threshold of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name_en = ?, name_ur = ?, name_ps = ?,
                purchase_price_cents = ?, selling_price_cents = ?,
                quantity = ?, unit = ?, category = ?,
                low_stock_threshold = ?, updated_at = ?
            WHERE id = ? AND account_id = ?
            "#,
        )
        .bind(&product.name_en)
        .bind(&product.name_ur)
        .bind(&product.name_ps)
        .bind(product.purchase_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.quantity)
        .bind(&product.unit)
        .bind(&product.category)
        .bind(product.low_stock_threshold)
        .bind(Utc::now())
        .bind(&product.id)
        .bind(&product.account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adds purchased units to stock.
    pub async fn restock(&self, account_id: &str, id: &str, units: i64) -> DbResult<()> {
        debug!(id = %id, units = %units, "Restocking product");

        let result = sqlx::query(
            "UPDATE products SET quantity = quantity + ?, updated_at = ? WHERE id = ? AND account_id = ?",
        )
        .bind(units)
        .bind(Utc::now())
        .bind(id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product. Past sale lines keep their snapshots and lose
    /// the reference (`product_id` becomes NULL).
    pub async fn delete(&self, account_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ? AND account_id = ?")
            .bind(id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts an account's products (entitlement product limit).
    pub async fn count(&self, account_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
