//! # Aggregation Engine
//!
//! Turns the raw ledger (sales, line items, catalog, expenses) into the
//! dashboard and report figures, filtered by the account's entitlement.
//!
//! ## Time Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  All windows are computed in the session's UTC offset and end at now.  │
//! │                                                                         │
//! │   month_start          week_start              today_start      now     │
//! │   (1st, 00:00)         (today 00:00 − 7d)      (00:00)           │      │
//! │        │                    │                       │            │      │
//! │  ──────●────────────────────●───────────────────────●────────────●───► │
//! │        [────────── monthly ──────────────────────────────────────]      │
//! │                             [────────── weekly ──────────────────]      │
//! │                                                     [── today ───]      │
//! │                                                                         │
//! │  Lower bounds are inclusive. Dashboard and report use the same         │
//! │  boundaries, so "weekly" means the same thing on both screens.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Entitlement Gating
//! - Degraded accounts see weekly and monthly sales as zero (`limited = true`)
//! - Report windows of degraded accounts are clamped to the allowed look-back
//! - Today's sales, profit, loss and low stock are never gated
//!
//! Everything here is in-memory over already-fetched rows; the caller
//! decides how fresh those rows are.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entitlement::Entitlement;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Expense, Locale, Product, Sale, SaleLineItem};
use crate::TOP_PRODUCTS_LIMIT;

// =============================================================================
// Inputs
// =============================================================================

/// Every row of one account that the aggregations read.
#[derive(Debug, Clone, Default)]
pub struct LedgerData {
    pub sales: Vec<Sale>,
    /// Line items of the sales above.
    pub line_items: Vec<SaleLineItem>,
    pub products: Vec<Product>,
    pub expenses: Vec<Expense>,
}

/// Per-call parameters: clock, timezone, language and entitlement.
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
    pub locale: Locale,
    pub entitlement: Entitlement,
}

// =============================================================================
// Windows
// =============================================================================

/// Report period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReportWindow {
    Daily,
    Weekly,
    Monthly,
}

impl ReportWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportWindow::Daily => "daily",
            ReportWindow::Weekly => "weekly",
            ReportWindow::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportWindow {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "today" => Ok(ReportWindow::Daily),
            "weekly" | "week" => Ok(ReportWindow::Weekly),
            "monthly" | "month" => Ok(ReportWindow::Monthly),
            _ => Err(ValidationError::NotAllowed {
                field: "report window".to_string(),
                allowed: vec!["daily".into(), "weekly".into(), "monthly".into()],
            }),
        }
    }
}

/// Window start instants for a given `now` and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub today_start: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
}

impl WindowBounds {
    pub fn at(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let today = local_date(now, offset);
        let first_of_month = today - Duration::days(i64::from(today.day0()));
        let today_start = local_midnight(today, offset);

        WindowBounds {
            today_start,
            week_start: today_start - Duration::days(7),
            month_start: local_midnight(first_of_month, offset),
        }
    }

    pub fn start_of(&self, window: ReportWindow) -> DateTime<Utc> {
        match window {
            ReportWindow::Daily => self.today_start,
            ReportWindow::Weekly => self.week_start,
            ReportWindow::Monthly => self.month_start,
        }
    }
}

/// Calendar date of `at` in the given offset.
pub fn local_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    Utc.from_utc_datetime(&(local - Duration::seconds(i64::from(offset.local_minus_utc()))))
}

fn in_window(at: DateTime<Utc>, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    at >= start && at <= now
}

// =============================================================================
// Dashboard
// =============================================================================

/// Headline figures for the dashboard. Amounts are minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub today_sales: i64,
    /// Zero when `limited`.
    pub weekly_sales: i64,
    /// Zero when `limited`.
    pub monthly_sales: i64,
    /// Lifetime profit across all sales.
    pub total_profit: i64,
    /// Lifetime expenses.
    pub total_loss: i64,
    pub low_stock_count: usize,
    pub top_products: Vec<TopProduct>,
    pub low_stock_products: Vec<LowStockProduct>,
    pub limited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LowStockProduct {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub unit: String,
}

/// Computes the dashboard for one account.
///
/// ## Example
/// ```rust
/// use chrono::{FixedOffset, Utc};
/// use dukan_core::analytics::{compute_dashboard, AnalyticsContext, LedgerData};
/// use dukan_core::{Entitlement, Locale, SubscriptionTier};
///
/// let now = Utc::now();
/// let ctx = AnalyticsContext {
///     now,
///     offset: FixedOffset::east_opt(5 * 3600).unwrap(),
///     locale: Locale::En,
///     entitlement: Entitlement::for_tier(SubscriptionTier::Free, None, now),
/// };
///
/// let metrics = compute_dashboard(&LedgerData::default(), &ctx);
/// assert_eq!(metrics.today_sales, 0);
/// assert!(metrics.top_products.is_empty());
/// assert!(metrics.limited);
/// ```
pub fn compute_dashboard(ledger: &LedgerData, ctx: &AnalyticsContext) -> DashboardMetrics {
    let bounds = WindowBounds::at(ctx.now, ctx.offset);
    let full_access = ctx.entitlement.has_full_access();

    let window_total = |start: DateTime<Utc>| -> i64 {
        ledger
            .sales
            .iter()
            .filter(|s| in_window(s.created_at, start, ctx.now))
            .map(|s| s.total_amount())
            .sum::<Money>()
            .cents()
    };

    let today_sales = window_total(bounds.today_start);
    let (weekly_sales, monthly_sales) = if full_access {
        (window_total(bounds.week_start), window_total(bounds.month_start))
    } else {
        (0, 0)
    };

    let total_profit = ledger.sales.iter().map(|s| s.profit()).sum::<Money>().cents();
    let total_loss = ledger.expenses.iter().map(|e| e.amount()).sum::<Money>().cents();

    let low_stock_products: Vec<LowStockProduct> = ledger
        .products
        .iter()
        .filter(|p| p.is_low_stock())
        .map(|p| LowStockProduct {
            product_id: p.id.clone(),
            name: p.display_name(ctx.locale).to_string(),
            quantity: p.quantity,
            low_stock_threshold: p.low_stock_threshold,
            unit: p.unit.clone(),
        })
        .collect();

    DashboardMetrics {
        today_sales,
        weekly_sales,
        monthly_sales,
        total_profit,
        total_loss,
        low_stock_count: low_stock_products.len(),
        top_products: top_products(ledger, ctx.locale),
        low_stock_products,
        limited: !full_access,
    }
}

/// Best sellers by revenue. Lines whose product no longer resolves in the
/// account's catalog are left out.
fn top_products(ledger: &LedgerData, locale: Locale) -> Vec<TopProduct> {
    let catalog: HashMap<&str, &Product> =
        ledger.products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut totals: HashMap<&str, (i64, Money)> = HashMap::new();
    for item in &ledger.line_items {
        let Some(product_id) = item.product_id.as_deref() else {
            continue;
        };
        if !catalog.contains_key(product_id) {
            continue;
        }
        let entry = totals.entry(product_id).or_insert((0, Money::zero()));
        entry.0 += item.quantity;
        entry.1 += item.subtotal();
    }

    let mut top: Vec<TopProduct> = totals
        .into_iter()
        .filter_map(|(id, (units, revenue))| {
            catalog.get(id).map(|p| TopProduct {
                product_id: id.to_string(),
                name: p.display_name(locale).to_string(),
                units_sold: units,
                revenue: revenue.cents(),
            })
        })
        .collect();

    top.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.units_sold.cmp(&a.units_sold))
            .then_with(|| a.name.cmp(&b.name))
    });
    top.truncate(TOP_PRODUCTS_LIMIT);
    top
}

// =============================================================================
// Report
// =============================================================================

/// Figures for one report window. Amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub window: ReportWindow,
    /// Effective start after entitlement clamping.
    #[ts(as = "String")]
    pub window_start: DateTime<Utc>,
    pub sales_by_date: Vec<DailySales>,
    pub product_sales: Vec<ProductSales>,
    pub total_sales: i64,
    pub total_profit: i64,
    pub total_expenses: i64,
    pub transaction_count: usize,
    pub limited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    /// `None` once the product has been deleted.
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub revenue: i64,
}

/// Computes the report for `window`.
pub fn compute_report(
    ledger: &LedgerData,
    window: ReportWindow,
    ctx: &AnalyticsContext,
) -> ReportMetrics {
    let bounds = WindowBounds::at(ctx.now, ctx.offset);
    let start = ctx
        .entitlement
        .clamp_window_start(bounds.start_of(window), ctx.now);

    let sales: Vec<&Sale> = ledger
        .sales
        .iter()
        .filter(|s| in_window(s.created_at, start, ctx.now))
        .collect();

    let mut by_date: BTreeMap<NaiveDate, (Money, usize)> = BTreeMap::new();
    for sale in &sales {
        let entry = by_date
            .entry(local_date(sale.created_at, ctx.offset))
            .or_insert((Money::zero(), 0));
        entry.0 += sale.total_amount();
        entry.1 += 1;
    }

    let sales_by_date = by_date
        .into_iter()
        .map(|(date, (total, count))| DailySales {
            date,
            total: total.cents(),
            count,
        })
        .collect();

    let first_day = local_date(start, ctx.offset);
    let last_day = local_date(ctx.now, ctx.offset);
    let total_expenses = ledger
        .expenses
        .iter()
        .filter(|e| e.expense_date >= first_day && e.expense_date <= last_day)
        .map(|e| e.amount())
        .sum::<Money>()
        .cents();

    ReportMetrics {
        window,
        window_start: start,
        product_sales: product_sales(ledger, &sales, ctx.locale),
        sales_by_date,
        total_sales: sales.iter().map(|s| s.total_amount()).sum::<Money>().cents(),
        total_profit: sales.iter().map(|s| s.profit()).sum::<Money>().cents(),
        total_expenses,
        transaction_count: sales.len(),
        limited: !ctx.entitlement.has_full_access(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ProductKey<'a> {
    Catalog(&'a str),
    /// Deleted product, grouped by the name it was sold under.
    Snapshot(&'a str),
}

fn product_sales(ledger: &LedgerData, sales: &[&Sale], locale: Locale) -> Vec<ProductSales> {
    let sale_ids: HashSet<&str> = sales.iter().map(|s| s.id.as_str()).collect();
    let catalog: HashMap<&str, &Product> =
        ledger.products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut grouped: HashMap<ProductKey<'_>, ProductSales> = HashMap::new();
    for item in ledger
        .line_items
        .iter()
        .filter(|i| sale_ids.contains(i.sale_id.as_str()))
    {
        let key = match item.product_id.as_deref() {
            Some(id) => ProductKey::Catalog(id),
            None => ProductKey::Snapshot(item.name_snapshot.as_str()),
        };

        let entry = grouped.entry(key).or_insert_with(|| {
            let name = item
                .product_id
                .as_deref()
                .and_then(|id| catalog.get(id))
                .map(|p| p.display_name(locale).to_string())
                .unwrap_or_else(|| item.name_snapshot.clone());

            ProductSales {
                product_id: item.product_id.clone(),
                name,
                quantity: 0,
                revenue: 0,
            }
        });
        entry.quantity += item.quantity;
        entry.revenue += item.subtotal_cents;
    }

    let mut rows: Vec<ProductSales> = grouped.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.quantity.cmp(&a.quantity))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================
