//! # Error Types
//!
//! Domain-specific error types for dukaan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dukaan-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger operation failures                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dukaan-db errors (separate crate)                                     │
//! │  └── DbError          - Persistence failures                           │
//! │                                                                         │
//! │  Result tags (result.rs)                                               │
//! │  └── ErrorTag         - What the response collaborator sees            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ErrorTag → ActionResult::Error    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ledger operations never panic on bad input; they return one of these and
//! leave committed state untouched.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger operation errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// A correction targeted a canonical key the ledger has never seen.
    ///
    /// ## When This Occurs
    /// - "Actually it was 7 kg of bhindi" before any okra was stocked
    /// - The spoken name normalized to a different key than the stock-in did
    ///
    /// Corrections never create entries, so this is reported, not repaired.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// A field the operation needs was absent from the intent.
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a MissingData error for the named field.
    pub fn missing(field: impl Into<String>) -> Self {
        CoreError::MissingData {
            field: field.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Quantities and prices are real numbers, so the bounds here are `f64`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// NaN or infinity slipped through from the classifier.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },
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
        let err = CoreError::ItemNotFound("okra".to_string());
        assert_eq!(err.to_string(), "Item not found: okra");

        let err = CoreError::missing("quantity");
        assert_eq!(err.to_string(), "Missing required data: quantity");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "item".to_string(),
        };
        assert_eq!(err.to_string(), "item is required");

        let err = ValidationError::OutOfRange {
            field: "confidence".to_string(),
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(err.to_string(), "confidence must be between 0 and 1");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::NotFinite {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
