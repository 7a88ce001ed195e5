//! # Error Types
//!
//! Domain-specific error types for mercado-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mercado-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mercado-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  mercado-sales errors                                                  │
//! │  └── SaleError        - What callers see (status class + message)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SaleError ← DbError               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::SaleStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested and product units have no vetted conversion.
    ///
    /// ## When This Occurs
    /// - `kg` requested against a `tn` product (reverse direction)
    /// - Any pair other than identity or `tn → kg`
    #[error("Unsupported unit conversion from '{from}' to '{to}'")]
    UnsupportedUnitConversion { from: String, to: String },

    /// Converted quantity exceeds the product's current stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Producer approves sale (2 tn)
    ///      │
    ///      ▼
    /// convert(tn → kg) = 2000
    ///      │
    ///      ▼
    /// Check stock: available=1500
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: 7, available: 1500, requested: 2000 }
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Status change not present in the sale status graph.
    #[error("Cannot change sale status from '{from}' to '{to}'")]
    InvalidTransition { from: SaleStatus, to: SaleStatus },

    /// Principal carries a role this engine does not know.
    #[error("Role '{0}' is not authorized for sale operations")]
    UnknownRole(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request doesn't meet the schema.
/// Used for early validation before any transaction is opened.
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

    /// Invalid format (e.g., bad file extension).
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 7,
            available: 1500,
            requested: 2000,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 7: available 1500, requested 2000"
        );

        let err = CoreError::InvalidTransition {
            from: SaleStatus::Completed,
            to: SaleStatus::Active,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change sale status from 'completed' to 'active'"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "unit".to_string(),
        };
        assert_eq!(err.to_string(), "unit is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "product_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
