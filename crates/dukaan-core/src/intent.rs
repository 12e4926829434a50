//! # Intent Records
//!
//! The structured input the classifier emits: one record per detected intent,
//! grouped into a batch per utterance.
//!
//! ```json
//! {"intents": [
//!   {"intent": "inventory_in", "item": "aloo", "quantity": 10, "unit": "kg", "total_amount": 200},
//!   {"intent": "expense", "category": "bijli", "total_amount": 500}
//! ]}
//! ```
//!
//! Every payload field is optional; handlers decide what they need and report
//! what is missing.

use serde::{Deserialize, Serialize};

use crate::validation::{validate_confidence, ValidationResult};

// =============================================================================
// Intent Kind
// =============================================================================

/// What the speaker wants done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Stock bought or received.
    #[serde(alias = "stock_in")]
    InventoryIn,
    /// Stock lost, spoiled or taken out without a sale.
    #[serde(alias = "stock_out")]
    InventoryOut,
    Sale,
    Expense,
    QueryStock,
    QuerySummary,
    QueryProfit,
    Greeting,
    CloseDay,
    Correction,
    /// Anything the classifier could not place, including kinds this build
    /// does not know.
    #[serde(other)]
    Unknown,
}

impl IntentKind {
    /// Wire name, e.g. `"inventory_in"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::InventoryIn => "inventory_in",
            IntentKind::InventoryOut => "inventory_out",
            IntentKind::Sale => "sale",
            IntentKind::Expense => "expense",
            IntentKind::QueryStock => "query_stock",
            IntentKind::QuerySummary => "query_summary",
            IntentKind::QueryProfit => "query_profit",
            IntentKind::Greeting => "greeting",
            IntentKind::CloseDay => "close_day",
            IntentKind::Correction => "correction",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Intent Record
// =============================================================================

fn default_confidence() -> f64 {
    1.0
}

/// One classified intent with whatever fields the classifier extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecord {
    pub intent: IntentKind,
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub price_per_unit: Option<f64>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl IntentRecord {
    /// Bare record of the given kind with no payload.
    pub fn new(intent: IntentKind) -> Self {
        IntentRecord {
            intent,
            item: None,
            quantity: None,
            unit: None,
            price_per_unit: None,
            total_amount: None,
            category: None,
            description: None,
            confidence: default_confidence(),
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_quantity(mut self, quantity: f64, unit: impl Into<String>) -> Self {
        self.quantity = Some(quantity);
        self.unit = Some(unit.into());
        self
    }

    pub fn with_price(mut self, price_per_unit: f64) -> Self {
        self.price_per_unit = Some(price_per_unit);
        self
    }

    pub fn with_total(mut self, total_amount: f64) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Item name with surrounding whitespace removed, if non-blank.
    pub fn item_name(&self) -> Option<&str> {
        self.item
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Unit as spoken, or empty.
    pub fn unit_or_empty(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }

    /// Checks the fields the classifier is contractually bound to.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_confidence(self.confidence)
    }
}

// =============================================================================
// Intent Batch
// =============================================================================

/// All intents detected in one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentBatch {
    pub intents: Vec<IntentRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BatchWire {
    Batch(IntentBatch),
    Single(IntentRecord),
}

impl IntentBatch {
    pub fn new(intents: Vec<IntentRecord>) -> Self {
        IntentBatch { intents }
    }

    /// Parses either `{"intents": [...]}` or a single bare record.
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<BatchWire>(input)? {
            BatchWire::Batch(batch) => Ok(batch),
            BatchWire::Single(record) => Ok(IntentBatch::new(vec![record])),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        let kind: IntentKind = serde_json::from_str("\"inventory_in\"").unwrap();
        assert_eq!(kind, IntentKind::InventoryIn);

        let kind: IntentKind = serde_json::from_str("\"stock_out\"").unwrap();
        assert_eq!(kind, IntentKind::InventoryOut);

        assert_eq!(serde_json::to_string(&IntentKind::CloseDay).unwrap(), "\"close_day\"");
        assert_eq!(IntentKind::QueryProfit.to_string(), "query_profit");
    }

    #[test]
    fn test_unrecognized_kind_is_unknown() {
        let kind: IntentKind = serde_json::from_str("\"order_pizza\"").unwrap();
        assert_eq!(kind, IntentKind::Unknown);
    }

    #[test]
    fn test_record_defaults() {
        let record: IntentRecord = serde_json::from_str(r#"{"intent": "greeting"}"#).unwrap();
        assert_eq!(record.intent, IntentKind::Greeting);
        assert_eq!(record.confidence, 1.0);
        assert!(record.item.is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_confidence_out_of_range() {
        let record: IntentRecord =
            serde_json::from_str(r#"{"intent": "sale", "confidence": 1.5}"#).unwrap();
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_batch_or_single() {
        let batch = IntentBatch::from_json(
            r#"{"intents": [{"intent": "sale", "item": "aloo", "quantity": 2}, {"intent": "greeting"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.intents.len(), 2);
        assert_eq!(batch.intents[0].quantity, Some(2.0));

        let single = IntentBatch::from_json(r#"{"intent": "expense", "total_amount": 50}"#).unwrap();
        assert_eq!(single.intents.len(), 1);
        assert_eq!(single.intents[0].intent, IntentKind::Expense);

        assert!(IntentBatch::from_json("not json").is_err());
    }

    #[test]
    fn test_item_name_trims_blank() {
        assert_eq!(IntentRecord::new(IntentKind::Sale).with_item("  ").item_name(), None);
        assert_eq!(
            IntentRecord::new(IntentKind::Sale).with_item(" aloo ").item_name(),
            Some("aloo")
        );
    }
}
