//! # Error Types
//!
//! Domain-specific error types for dukan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dukan-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── CouponError      - Why a coupon was rejected                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dukan-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  backoffice errors (app)                                               │
//! │  └── ApiError         - What the presentation layer sees               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Frontend     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the account's catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds the product's on-hand quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 3, already 3 in cart)
    ///      │
    ///      ▼
    /// Check stock: available=5
    ///      │
    ///      ▼
    /// OutOfStock { product: "Rice 5kg", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// UI shows: "Only 5 Rice 5kg in stock", cart unchanged
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    OutOfStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// The account's tier does not allow another product.
    #[error("Product limit of {limit} reached for the {tier} plan")]
    ProductLimitReached { tier: String, limit: u32 },

    /// Coupon rejected during pricing.
    #[error("Invalid coupon: {0}")]
    InvalidCoupon(#[from] CouponError),

    /// Operation requires the admin role.
    #[error("Operation requires admin role")]
    Forbidden,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Reasons a coupon code cannot be applied to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("coupon {0} does not exist")]
    NotFound(String),

    #[error("coupon {0} is not active")]
    Inactive(String),

    #[error("coupon {0} has expired")]
    Expired(String),

    /// `used_count` already reached `usage_limit`.
    #[error("coupon {0} has reached its usage limit")]
    UsageLimitReached(String),

    #[error("coupons cannot be applied to the free plan")]
    FreeTier,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid coupon code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
