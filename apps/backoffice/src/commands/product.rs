//! # Product Commands
//!
//! Catalog management for the session's account.
//!
//! ## Product Limit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog vs. Plan                                     │
//! │                                                                         │
//! │  create_product                                                         │
//! │    1. validate fields            ─── VALIDATION_ERROR                  │
//! │    2. resolve entitlement at now                                       │
//! │    3. count < product_limit?     ─── PRODUCT_LIMIT_REACHED             │
//! │    4. insert                                                           │
//! │                                                                         │
//! │  list_products                                                          │
//! │    returns at most product_limit rows ordered by name, so a shop that  │
//! │    downgraded keeps its data but only sees what the plan allows        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use super::resolve_entitlement;
use crate::error::ApiError;
use crate::state::{DbState, SessionContext};
use dukan_core::validation::{
    validate_amount_cents, validate_product_name, validate_quantity, validate_stock_level,
};
use dukan_core::{CoreError, Locale, Product};
use dukan_db::generate_product_id;

/// Input for creating or editing a product. Prices are minor units.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name_en: String,
    pub name_ur: Option<String>,
    pub name_ps: Option<String>,
    pub purchase_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity: i64,
    /// Defaults to "piece".
    pub unit: Option<String>,
    pub category: Option<String>,
    /// Defaults to 5.
    pub low_stock_threshold: Option<i64>,
}

/// A catalog row as shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    /// Name in the session's language.
    pub display_name: String,
    pub selling_price_cents: i64,
    pub purchase_price_cents: i64,
    pub quantity: i64,
    pub unit: String,
    pub category: Option<String>,
    pub low_stock: bool,
}

impl ProductView {
    pub fn new(product: &Product, locale: Locale) -> Self {
        ProductView {
            id: product.id.clone(),
            display_name: product.display_name(locale).to_string(),
            selling_price_cents: product.selling_price_cents,
            purchase_price_cents: product.purchase_price_cents,
            quantity: product.quantity,
            unit: product.unit.clone(),
            category: product.category.clone(),
            low_stock: product.is_low_stock(),
        }
    }
}

const DEFAULT_UNIT: &str = "piece";
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Adds a product to the catalog.
///
/// ## Errors
/// - `VALIDATION_ERROR` for an empty name or negative amounts
/// - `PRODUCT_LIMIT_REACHED` when the plan's cap is already used up
pub async fn create_product(
    db: &DbState,
    session: &SessionContext,
    input: ProductInput,
    now: DateTime<Utc>,
) -> Result<ProductView, ApiError> {
    debug!(name = %input.name_en, "create_product command");
    let threshold = validate_input(&input)?;

    let (_, entitlement) = resolve_entitlement(db, session, now).await?;
    let current = db.inner().products().count(&session.account_id).await?;

    if !entitlement.can_add_product(current) {
        return Err(CoreError::ProductLimitReached {
            tier: entitlement.tier.to_string(),
            limit: entitlement.product_limit.unwrap_or_default(),
        }
        .into());
    }

    let product = Product {
        id: generate_product_id(),
        account_id: session.account_id.clone(),
        name_en: input.name_en.trim().to_string(),
        name_ur: non_blank(input.name_ur),
        name_ps: non_blank(input.name_ps),
        purchase_price_cents: input.purchase_price_cents,
        selling_price_cents: input.selling_price_cents,
        quantity: input.quantity,
        unit: non_blank(input.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        category: non_blank(input.category),
        low_stock_threshold: threshold,
        created_at: now,
        updated_at: now,
    };

    db.inner().products().insert(&product).await?;

    info!(id = %product.id, name = %product.name_en, "Product created");

    Ok(ProductView::new(&product, session.locale))
}

/// Replaces the editable fields of an existing product.
///
/// The product limit does not apply: editing never adds to the catalog.
pub async fn update_product(
    db: &DbState,
    session: &SessionContext,
    product_id: &str,
    input: ProductInput,
) -> Result<ProductView, ApiError> {
    debug!(product_id = %product_id, "update_product command");
    let threshold = validate_input(&input)?;

    let mut product = db
        .inner()
        .products()
        .get_by_id(&session.account_id, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    product.name_en = input.name_en.trim().to_string();
    product.name_ur = non_blank(input.name_ur);
    product.name_ps = non_blank(input.name_ps);
    product.purchase_price_cents = input.purchase_price_cents;
    product.selling_price_cents = input.selling_price_cents;
    product.quantity = input.quantity;
    product.unit = non_blank(input.unit).unwrap_or_else(|| DEFAULT_UNIT.to_string());
    product.category = non_blank(input.category);
    product.low_stock_threshold = threshold;

    db.inner().products().update(&product).await?;

    info!(id = %product.id, name = %product.name_en, "Product updated");

    Ok(ProductView::new(&product, session.locale))
}

/// Lists the catalog ordered by English name, capped at the plan's
/// product limit.
pub async fn list_products(
    db: &DbState,
    session: &SessionContext,
    now: DateTime<Utc>,
) -> Result<Vec<ProductView>, ApiError> {
    let (_, entitlement) = resolve_entitlement(db, session, now).await?;

    let products = db
        .inner()
        .products()
        .list(&session.account_id, entitlement.product_limit)
        .await?;

    Ok(products
        .iter()
        .map(|p| ProductView::new(p, session.locale))
        .collect())
}

/// Adds purchased units to a product's stock.
pub async fn restock_product(
    db: &DbState,
    session: &SessionContext,
    product_id: &str,
    units: i64,
) -> Result<ProductView, ApiError> {
    debug!(product_id = %product_id, units = %units, "restock_product command");
    validate_quantity(units)?;

    db.inner().products().restock(&session.account_id, product_id, units).await?;

    let product = db
        .inner()
        .products()
        .get_by_id(&session.account_id, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", product_id))?;

    Ok(ProductView::new(&product, session.locale))
}

/// Removes a product. Past sales keep their line snapshots.
pub async fn delete_product(
    db: &DbState,
    session: &SessionContext,
    product_id: &str,
) -> Result<(), ApiError> {
    debug!(product_id = %product_id, "delete_product command");
    db.inner().products().delete(&session.account_id, product_id).await?;
    Ok(())
}

pub async fn low_stock_products(
    db: &DbState,
    session: &SessionContext,
) -> Result<Vec<ProductView>, ApiError> {
    let products = db.inner().products().low_stock(&session.account_id).await?;

    Ok(products
        .iter()
        .map(|p| ProductView::new(p, session.locale))
        .collect())
}

/// Field checks shared by create and update. Returns the effective
/// low-stock threshold.
fn validate_input(input: &ProductInput) -> Result<i64, ApiError> {
    validate_product_name(&input.name_en)?;
    validate_amount_cents("purchase price", input.purchase_price_cents)?;
    validate_amount_cents("selling price", input.selling_price_cents)?;
    validate_stock_level("quantity", input.quantity)?;

    let threshold = input.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    validate_stock_level("low stock threshold", threshold)?;

    Ok(threshold)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
