//! # Domain Types
//!
//! Records owned by the ledger and the derived summary shapes.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryEntry  │   │   SaleRecord    │   │ ExpenseRecord   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  key (unique)   │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  quantity (±)   │   │  item key       │   │  category key   │       │
//! │  │  unit           │   │  quantity, unit │   │  amount         │       │
//! │  │  avg cost       │   │  price, total   │   │  description    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │     mutable, one per       append-only,          append-only,          │
//! │     canonical key          immutable             immutable             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │ DailySummary - derived on every query, never stored              │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unit recorded when the speaker did not name one.
pub const DEFAULT_UNIT: &str = "unit";

// =============================================================================
// Inventory Entry
// =============================================================================

/// On-hand stock for one canonical item key.
///
/// `quantity` goes negative when more is sold than was ever stocked; that is
/// a signal, not an error, and is never clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryEntry {
    /// Canonical item key (lowercase, singular, English).
    pub key: String,

    /// On-hand quantity. May be negative.
    pub quantity: f64,

    /// Unit label as last spoken ("kg", "packet", ...).
    pub unit: String,

    /// Quantity-weighted mean cost across stock-ins, or the corrected value.
    pub avg_cost_per_unit: f64,

    /// When this entry last changed.
    #[ts(as = "String")]
    pub last_modified: DateTime<Utc>,
}

impl InventoryEntry {
    /// Value of the on-hand stock at average cost. Zero unless quantity > 0.
    pub fn stock_value(&self) -> f64 {
        if self.quantity > 0.0 {
            self.quantity * self.avg_cost_per_unit
        } else {
            0.0
        }
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// One sale, frozen at the moment it was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleRecord {
    /// Row id (UUID v4), generated on append.
    pub id: String,
    /// Canonical item key.
    pub item: String,
    pub quantity: f64,
    pub unit: String,
    pub price_per_unit: f64,
    /// Revenue for this sale. Taken as given when the speaker stated it.
    pub total: f64,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Expense Record
// =============================================================================

/// One operating expense (rent, electricity, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ExpenseRecord {
    pub id: String,
    /// Canonical category key.
    pub category: String,
    pub amount: f64,
    pub description: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

/// Generates a new record id.
pub fn generate_record_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Summary Shapes
// =============================================================================

/// Units sold and revenue for one key, aggregated across the day's sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SoldItem {
    pub item: String,
    pub quantity: f64,
    pub unit: String,
    pub revenue: f64,
}

/// One expense as listed in a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseLine {
    pub category: String,
    pub amount: f64,
    pub description: String,
}

/// A key with its on-hand quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLine {
    pub item: String,
    pub quantity: f64,
    pub unit: String,
}

impl From<&InventoryEntry> for StockLine {
    fn from(entry: &InventoryEntry) -> Self {
        StockLine {
            item: entry.key.clone(),
            quantity: entry.quantity,
            unit: entry.unit.clone(),
        }
    }
}

/// Aggregate view of the day. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    /// ISO calendar date, e.g. "2026-10-19".
    pub date: String,
    pub total_sales: f64,
    pub total_expenses: f64,
    pub cost_of_goods_sold: f64,
    /// sales - COGS - expenses. Unsold stock is not a loss.
    pub profit: f64,
    /// Top sellers by revenue.
    pub items_sold: Vec<SoldItem>,
    /// Largest expenses.
    pub expenses_list: Vec<ExpenseLine>,
    /// Everything with quantity > 0.
    pub inventory_remaining: Vec<StockLine>,
    /// Formatted as "potato (3 kg)".
    pub low_stock_items: Vec<String>,
    pub inventory_value: f64,
}

// =============================================================================
// Day Labels
// =============================================================================

/// Formats a date as the ISO day label used to scope the rolling window.
pub fn day_label(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Day label for the shop's local calendar day.
pub fn today_label() -> String {
    day_label(Local::now().date_naive())
}

// =============================================================================
// Unit Tests
// =============================================================================
