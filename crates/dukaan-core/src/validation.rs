//! # Validation Module
//!
//! Input checks applied before the ledger mutates anything.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Intent handler                                               │
//! │  ├── Presence checks (item? quantity? amount?)                         │
//! │  └── Reported as missing_data / missing_amount result tags             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: LedgerStore (THIS MODULE)                                    │
//! │  ├── Finite numbers only                                               │
//! │  └── Sign rules per operation                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / PRIMARY KEY constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dukaan_core::validation::{validate_quantity, validate_confidence};
//!
//! assert!(validate_quantity(2.5).is_ok());
//! assert!(validate_quantity(-1.0).is_err());
//! assert!(validate_confidence(0.9).is_ok());
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a canonical key produced by the normalizer.
///
/// An empty key means the raw name was blank; the ledger refuses to index it.
pub fn validate_key(key: &str) -> ValidationResult<()> {
    if key.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

fn validate_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a quantity moving in or out of stock.
///
/// ## Rules
/// - Must be finite
/// - Must be zero or more (direction comes from the operation, not the sign)
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    validate_finite("quantity", qty)?;

    if qty < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a corrected quantity.
///
/// Corrections may set a negative on-hand figure, so only finiteness is checked.
pub fn validate_corrected_quantity(qty: f64) -> ValidationResult<()> {
    validate_finite("quantity", qty)
}

/// Validates a per-unit price or cost.
///
/// ## Example
/// ```rust
/// use dukaan_core::validation::validate_price;
///
/// assert!(validate_price(40.0).is_ok());
/// assert!(validate_price(0.0).is_ok());      // free sample
/// assert!(validate_price(-5.0).is_err());
/// assert!(validate_price(f64::NAN).is_err());
/// ```
pub fn validate_price(price: f64) -> ValidationResult<()> {
    validate_finite("price", price)?;

    if price < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates an expense amount.
///
/// ## Rules
/// - Must be finite
/// - Must be positive (> 0); a zero expense is a missing amount
pub fn validate_amount(amount: f64) -> ValidationResult<()> {
    validate_finite("amount", amount)?;

    if amount <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a classifier confidence score.
pub fn validate_confidence(confidence: f64) -> ValidationResult<()> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ValidationError::OutOfRange {
            field: "confidence".to_string(),
            min: 0.0,
            max: 1.0,
        });
    }

    Ok(())
}

/// Validates a low-stock threshold.
pub fn validate_threshold(threshold: f64) -> ValidationResult<()> {
    validate_finite("threshold", threshold)?;

    if threshold < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "threshold".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
