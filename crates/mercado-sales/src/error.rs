//! # Sale Error Type
//!
//! The error taxonomy callers of the engine see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Sale Engine                        │
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► SaleError ──► ErrorEnvelope       │
//! │  sqlx::Error ──────► DbError ────┤      │            { message, code }  │
//! │                                  │      │                               │
//! │  StorageError ───────────────────┘      └── status_code(): 400..504     │
//! │                                                                         │
//! │  Any error inside an operation drops its transaction → rollback.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retries
//! Nothing is retried automatically. Callers may retry only what
//! [`SaleError::is_retryable`] allows.

use std::time::Duration;

use mercado_core::{CoreError, ValidationError};
use mercado_db::DbError;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by every [`SaleEngine`](crate::SaleEngine) operation.
#[derive(Debug, Error)]
pub enum SaleError {
    /// Malformed or missing request fields (400).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Linked customer/producer, product or sale is absent or out of scope (404).
    ///
    /// ## When This Occurs
    /// - Principal has no linked customer/producer record
    /// - Product id doesn't exist
    /// - Sale doesn't exist **or** belongs to someone else (indistinguishable)
    #[error("{0} not found")]
    NotFound(String),

    /// Wrong role for the operation (403).
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// Status graph violation, or a deletion the policy forbids (409).
    #[error("{0}")]
    InvalidTransition(String),

    /// Requested unit has no vetted conversion to the product's unit (400).
    #[error("Unsupported unit conversion from '{from}' to '{to}'")]
    UnsupportedUnitConversion { from: String, to: String },

    /// Approval would take more than the product's stock (409).
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Admission queue full, pool exhausted or database busy (503).
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The voucher store failed; the operation was rolled back (503).
    #[error("Voucher storage failed: {0}")]
    StorageFailure(#[from] StorageError),

    /// The operation exceeded its deadline and was rolled back (504).
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Unexpected database failure (500).
    #[error("Database error: {0}")]
    Database(String),
}

/// Result type for engine operations.
pub type SaleResult<T> = Result<T, SaleError>;

impl SaleError {
    pub fn not_found(what: impl Into<String>) -> Self {
        SaleError::NotFound(what.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        SaleError::Unauthorized(reason.into())
    }

    /// HTTP-style status class.
    pub fn status_code(&self) -> u16 {
        match self {
            SaleError::Validation(_) | SaleError::UnsupportedUnitConversion { .. } => 400,
            SaleError::Unauthorized(_) => 403,
            SaleError::NotFound(_) => 404,
            SaleError::InvalidTransition(_) | SaleError::InsufficientStock { .. } => 409,
            SaleError::Database(_) => 500,
            SaleError::ResourceExhausted(_) | SaleError::StorageFailure(_) => 503,
            SaleError::Timeout(_) => 504,
        }
    }

    /// Machine-readable kind, stable across message changes.
    pub fn kind(&self) -> &'static str {
        match self {
            SaleError::Validation(_) => "VALIDATION_ERROR",
            SaleError::NotFound(_) => "NOT_FOUND",
            SaleError::Unauthorized(_) => "UNAUTHORIZED",
            SaleError::InvalidTransition(_) => "INVALID_TRANSITION",
            SaleError::UnsupportedUnitConversion { .. } => "UNSUPPORTED_UNIT_CONVERSION",
            SaleError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            SaleError::ResourceExhausted(_) => "RESOURCE_EXHAUSTED",
            SaleError::StorageFailure(_) => "STORAGE_FAILURE",
            SaleError::Timeout(_) => "TIMEOUT",
            SaleError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Whether a caller may retry the same request.
    ///
    /// Only failures that left no trace (rolled back before doing
    /// anything durable) qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SaleError::ResourceExhausted(_) | SaleError::StorageFailure(_) | SaleError::Timeout(_)
        )
    }
}

/// Converts core errors to sale errors.
impl From<CoreError> for SaleError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedUnitConversion { from, to } => {
                SaleError::UnsupportedUnitConversion { from, to }
            }
            CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            } => SaleError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            e @ CoreError::InvalidTransition { .. } => SaleError::InvalidTransition(e.to_string()),
            CoreError::UnknownRole(role) => {
                SaleError::Unauthorized(format!("role '{role}' cannot perform sale operations"))
            }
            CoreError::Validation(e) => SaleError::Validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::Validation(err.to_string())
    }
}

/// Converts database errors to sale errors.
impl From<DbError> for SaleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => SaleError::NotFound(entity),
            DbError::PoolExhausted => {
                SaleError::ResourceExhausted("database connection pool exhausted".to_string())
            }
            DbError::Busy => {
                SaleError::ResourceExhausted("database is busy, try again".to_string())
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                SaleError::Validation("invalid reference".to_string())
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                SaleError::Database("database operation failed".to_string())
            }
        }
    }
}

impl From<sqlx::Error> for SaleError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
