//! # Action Results
//!
//! What the ledger reports back for each handled intent. One tagged variant
//! per action, carrying only the fields that action produces:
//!
//! ```json
//! {"action": "stock_added", "item": "potato", "quantity": 10.0, ...}
//! {"action": "error", "failed_action": "sale_recorded", "error": "missing_data", "item": null, "category": null}
//! ```
//!
//! Failures are values, not panics: the response collaborator renders an
//! `error` result as an apology or a retry prompt.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::types::{DailySummary, StockLine};

// =============================================================================
// Error Tag
// =============================================================================

/// Machine-readable failure reason shown to the response collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ErrorTag {
    /// Item or quantity absent.
    MissingData,
    /// Expense with no positive amount.
    MissingAmount,
    /// Correction for a key the ledger has never seen.
    ItemNotFound,
    /// Present but unusable (NaN, negative price, confidence out of range).
    InvalidInput,
}

impl From<&CoreError> for ErrorTag {
    fn from(err: &CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(_) => ErrorTag::ItemNotFound,
            CoreError::MissingData { .. } => ErrorTag::MissingData,
            CoreError::Validation(ValidationError::Required { .. }) => ErrorTag::MissingData,
            CoreError::Validation(_) => ErrorTag::InvalidInput,
        }
    }
}

// =============================================================================
// Action Result
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum ActionResult {
    StockAdded {
        item: String,
        quantity: f64,
        unit: String,
        price_per_unit: f64,
        total_value: f64,
        current_stock: f64,
        current_unit: String,
    },
    StockRemoved {
        item: String,
        quantity: f64,
        current_stock: f64,
        unit: String,
    },
    SaleRecorded {
        item: String,
        quantity: f64,
        unit: String,
        price_per_unit: f64,
        revenue: f64,
        remaining_stock: f64,
        remaining_unit: String,
        daily_sales_total: f64,
    },
    ExpenseRecorded {
        category: String,
        amount: f64,
        description: String,
        daily_expense_total: f64,
    },
    /// Entry after a correction was applied.
    Correction {
        item: String,
        quantity: f64,
        unit: String,
        price_per_unit: f64,
    },
    /// One item's stock. `found` is false for keys the ledger does not know,
    /// in which case quantity is 0 and unit is `"unknown"`.
    StockInfo {
        item: String,
        quantity: f64,
        unit: String,
        found: bool,
    },
    FullStock {
        items: Vec<StockLine>,
        total_items: usize,
    },
    Summary {
        summary: DailySummary,
        is_closing: bool,
    },
    Profit {
        total_sales: f64,
        cost_of_goods_sold: f64,
        total_expenses: f64,
        profit: f64,
    },
    Greeting,
    /// Echoes the wire name of an intent nobody handles.
    Unknown {
        intent: String,
    },
    Error {
        /// The action that would have been reported on success.
        failed_action: String,
        error: ErrorTag,
        item: Option<String>,
        category: Option<String>,
    },
}

impl ActionResult {
    /// Error result with no item or category context.
    pub fn error(failed_action: impl Into<String>, error: ErrorTag) -> Self {
        ActionResult::Error {
            failed_action: failed_action.into(),
            error,
            item: None,
            category: None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ActionResult::Error { .. })
    }

    /// The `action` tag this result serializes with.
    pub fn action(&self) -> &'static str {
        match self {
            ActionResult::StockAdded { .. } => "stock_added",
            ActionResult::StockRemoved { .. } => "stock_removed",
            ActionResult::SaleRecorded { .. } => "sale_recorded",
            ActionResult::ExpenseRecorded { .. } => "expense_recorded",
            ActionResult::Correction { .. } => "correction",
            ActionResult::StockInfo { .. } => "stock_info",
            ActionResult::FullStock { .. } => "full_stock",
            ActionResult::Summary { .. } => "summary",
            ActionResult::Profit { .. } => "profit",
            ActionResult::Greeting => "greeting",
            ActionResult::Unknown { .. } => "unknown",
            ActionResult::Error { .. } => "error",
        }
    }
}

// =============================================================================
// Batch Outcome
// =============================================================================

/// Low-stock state after a batch was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LowStockAlert {
    /// Formatted as "potato (3 kg)".
    pub items: Vec<String>,
    pub threshold: f64,
}

/// Everything produced for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchOutcome {
    /// One result per intent, in input order.
    pub results: Vec<ActionResult>,
    pub alerts: LowStockAlert,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_tag_mapping() {
        assert_eq!(
            ErrorTag::from(&CoreError::ItemNotFound("okra".into())),
            ErrorTag::ItemNotFound
        );
        assert_eq!(ErrorTag::from(&CoreError::missing("quantity")), ErrorTag::MissingData);

        let blank_item = CoreError::Validation(ValidationError::Required { field: "item".into() });
        assert_eq!(ErrorTag::from(&blank_item), ErrorTag::MissingData);

        let nan = CoreError::Validation(ValidationError::NotFinite { field: "price".into() });
        assert_eq!(ErrorTag::from(&nan), ErrorTag::InvalidInput);
    }

    #[test]
    fn test_results_are_tagged_by_action() {
        let result = ActionResult::StockRemoved {
            item: "rice".into(),
            quantity: 2.0,
            current_stock: 3.0,
            unit: "kg".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "action": "stock_removed",
                "item": "rice",
                "quantity": 2.0,
                "current_stock": 3.0,
                "unit": "kg"
            })
        );
        assert_eq!(result.action(), "stock_removed");

        let value = serde_json::to_value(ActionResult::Greeting).unwrap();
        assert_eq!(value, json!({"action": "greeting"}));
    }

    #[test]
    fn test_error_result_shape() {
        let result = ActionResult::error("expense_recorded", ErrorTag::MissingAmount);
        assert!(result.is_error());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["action"], "error");
        assert_eq!(value["failed_action"], "expense_recorded");
        assert_eq!(value["error"], "missing_amount");
    }
}
