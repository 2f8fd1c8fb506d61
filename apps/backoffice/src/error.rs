//! # API Error Type
//!
//! Unified error type for back-office commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Dukan Ledger                       │
//! │                                                                         │
//! │  Presentation layer           Rust Backend                              │
//! │  ──────────────────           ────────────                              │
//! │                                                                         │
//! │  commit_sale(...)                                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::StockConflict ──────┐             │  │
//! │  │         │                                         │             │  │
//! │  │         ▼                                         ▼             │  │
//! │  │  Business rule? ─── CoreError::OutOfStock ───── ApiError ──────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  { "code": "OUT_OF_STOCK",                                             │
//! │    "message": "Insufficient stock for Rice: available 2, requested 3" }│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Failures
//! A failed sale commit is reported with [`ApiError::from_commit`] rather
//! than the generic `From<DbError>`: storage failures during the commit are
//! `SALE_CREATION_FAILED`, not `DATABASE_ERROR`.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use dukan_core::{CoreError, ValidationError};
use dukan_db::DbError;

/// API error returned from commands.
///
/// ## Serialization
/// This is what the presentation layer receives when a command fails:
/// ```json
/// {
///   "code": "INVALID_COUPON",
///   "message": "coupon EID50 has expired"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
#[error("[{}] {message}", code.as_str())]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed input, rejected before any write
    ValidationError,

    /// Cart add or commit-time recheck failed
    OutOfStock,

    /// Coupon not found, inactive, expired, exhausted, or free tier
    InvalidCoupon,

    /// A write of the sale commit failed; nothing was persisted
    SaleCreationFailed,

    /// Store cannot be reached (pool closed, timed out)
    PersistenceUnavailable,

    /// Entitlement product limit reached
    ProductLimitReached,

    /// Resource not found
    NotFound,

    /// Operation requires the admin role
    Forbidden,

    /// Any other database failure
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::OutOfStock => "OUT_OF_STOCK",
            ErrorCode::InvalidCoupon => "INVALID_COUPON",
            ErrorCode::SaleCreationFailed => "SALE_CREATION_FAILED",
            ErrorCode::PersistenceUnavailable => "PERSISTENCE_UNAVAILABLE",
            ErrorCode::ProductLimitReached => "PRODUCT_LIMIT_REACHED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn forbidden() -> Self {
        ApiError::new(ErrorCode::Forbidden, "Operation requires admin role")
    }

    /// Maps a failed sale commit.
    ///
    /// ```text
    /// StockConflict            → OUT_OF_STOCK
    /// NotFound (product gone)  → NOT_FOUND
    /// ConnectionFailed / Pool  → PERSISTENCE_UNAVAILABLE
    /// anything else            → SALE_CREATION_FAILED
    /// ```
    pub fn from_commit(err: DbError) -> Self {
        match err {
            DbError::StockConflict { .. } => ApiError::new(ErrorCode::OutOfStock, err.to_string()),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            err if err.is_unavailable() => ApiError::new(
                ErrorCode::PersistenceUnavailable,
                "Store is unavailable, sale was not recorded",
            ),
            err => {
                tracing::error!(error = %err, "Sale commit failed");
                ApiError::new(
                    ErrorCode::SaleCreationFailed,
                    "Sale could not be recorded, nothing was changed",
                )
            }
        }
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::StockConflict { .. } => ApiError::new(ErrorCode::OutOfStock, err.to_string()),
            DbError::Coupon(e) => ApiError::new(ErrorCode::InvalidCoupon, e.to_string()),
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::UniqueViolation { field, value } => ApiError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::CheckViolation(message) => {
                tracing::warn!("Check constraint violation: {}", message);
                ApiError::validation("Value violates a ledger constraint")
            }
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::PersistenceUnavailable, "Store is unavailable")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::OutOfStock { .. } => ApiError::new(ErrorCode::OutOfStock, err.to_string()),
            CoreError::CartTooLarge { .. } => ApiError::validation(err.to_string()),
            CoreError::ProductLimitReached { .. } => {
                ApiError::new(ErrorCode::ProductLimitReached, err.to_string())
            }
            CoreError::InvalidCoupon(e) => ApiError::new(ErrorCode::InvalidCoupon, e.to_string()),
            CoreError::Forbidden => ApiError::forbidden(),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}
