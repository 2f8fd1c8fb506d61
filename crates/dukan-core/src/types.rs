//! # Domain Types
//!
//! Core domain entities of the ledger. Every row read from the store is
//! mapped into one of these structs at the repository boundary.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Account      │   │    Product      │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  tier / expiry  │◄──│  account_id     │   │  account_id     │       │
//! │  │  role / locale  │   │  prices, qty    │   │  receipt_number │       │
//! │  └─────────────────┘   └────────▲────────┘   └────────▲────────┘       │
//! │                                 │ weak ref            │ owns           │
//! │  ┌─────────────────┐   ┌────────┴─────────────────────┴──┐            │
//! │  │    Expense      │   │          SaleLineItem            │            │
//! │  │  amount, date   │   │  product_id (nullable), snapshot │            │
//! │  └─────────────────┘   └──────────────────────────────────┘            │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │ Subscription    │   │     Coupon      │                             │
//! │  │ Record          │   │  code (UPPER)   │                             │
//! │  │ tier, amount    │   │  limit / used   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale line items copy the product's name and price at the moment of sale.
//! Later catalog edits (or deletion) never rewrite history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Enumerations
// =============================================================================

/// Subscription level controlling feature and volume entitlements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Standard,
    Premium,
}

impl SubscriptionTier {
    /// Lowercase label, matching the stored value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Standard => "standard",
            SubscriptionTier::Premium => "premium",
        }
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        SubscriptionTier::Free
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "standard" => Ok(SubscriptionTier::Standard),
            "premium" => Ok(SubscriptionTier::Premium),
            _ => Err(ValidationError::NotAllowed {
                field: "tier".to_string(),
                allowed: vec!["free".into(), "standard".into(), "premium".into()],
            }),
        }
    }
}

/// Account role. Admins may read the cross-account revenue summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    User,
    Admin,
}

impl Default for AccountRole {
    fn default() -> Self {
        AccountRole::User
    }
}

/// Interface language of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    En,
    /// Urdu
    Ur,
    /// Pashto
    Ps,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::En
    }
}

/// Payment method label. No payment gateway is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "online" => Ok(PaymentMethod::Online),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "online".into()],
            }),
        }
    }
}

/// Status of a subscription payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

// =============================================================================
// Account
// =============================================================================

/// A business using the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub business_name: String,
    pub subscription_tier: SubscriptionTier,
    /// Only meaningful for paid tiers.
    #[ts(as = "Option<String>")]
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub role: AccountRole,
    pub locale: Locale,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog item owned by exactly one account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning account.
    pub account_id: String,

    /// English name, always present.
    pub name_en: String,

    /// Urdu name.
    pub name_ur: Option<String>,

    /// Pashto name.
    pub name_ps: Option<String>,

    /// What the shop paid per unit (minor units).
    pub purchase_price_cents: i64,

    /// What the shop charges per unit (minor units).
    pub selling_price_cents: i64,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Unit label ("piece", "kg", ...).
    pub unit: String,

    pub category: Option<String>,

    /// Product is "low stock" once `quantity <= low_stock_threshold`.
    pub low_stock_threshold: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    /// Name in the requested language, falling back to English.
    pub fn display_name(&self, locale: Locale) -> &str {
        let localized = match locale {
            Locale::En => None,
            Locale::Ur => self.name_ur.as_deref(),
            Locale::Ps => self.name_ps.as_deref(),
        };

        localized
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.name_en)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A posted sale. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub account_id: String,
    pub receipt_number: String,
    /// Sum of the line subtotals.
    pub total_amount_cents: i64,
    /// Sum of the line profits.
    pub profit_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

/// Optional customer details captured with a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl CustomerInfo {
    /// Drops blank fields so they are stored as NULL.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        CustomerInfo {
            name: clean(self.name),
            phone: clean(self.phone),
        }
    }
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// A line in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    /// Weak reference; NULL once the product is deleted.
    pub product_id: Option<String>,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit selling price at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity × unit price.
    pub subtotal_cents: i64,
    /// quantity × (unit price − purchase price at time of sale).
    pub profit_cents: i64,
}

impl SaleLineItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// Money spent by the business, independent of sales.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub account_id: String,
    pub description: String,
    pub amount_cents: i64,
    pub category: Option<String>,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Subscription Record
// =============================================================================

/// One historical subscription change. The newest record is "current".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: String,
    pub account_id: String,
    pub tier: SubscriptionTier,
    /// Amount actually charged after any coupon.
    pub amount_cents: i64,
    pub coupon_code: Option<String>,
    pub payment_status: PaymentStatus,
    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Coupon
// =============================================================================

/// An absolute-amount discount on a subscription price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    /// Always stored uppercase.
    pub code: String,
    pub discount_amount_cents: i64,
    pub usage_limit: i64,
    pub used_count: i64,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    #[inline]
    pub fn discount_amount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }

    /// Upper-cases and trims a user-entered code for lookup.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
