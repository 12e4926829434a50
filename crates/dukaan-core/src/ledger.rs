//! # Ledger Store
//!
//! The in-memory ledger: one inventory entry per canonical key plus the
//! append-only sale and expense sequences for the current day.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerStore                                                            │
//! │  ├── NormalizationEngine   raw names ──► canonical keys                │
//! │  ├── inventory  BTreeMap<key, InventoryEntry>   mutable                │
//! │  ├── sales      Vec<SaleRecord>                 append-only            │
//! │  └── expenses   Vec<ExpenseRecord>              append-only            │
//! │                                                                         │
//! │  record_sale ──► append SaleRecord ──► remove_stock (same quantity)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is constructed explicitly and passed by `&mut` to whoever
//! mutates it. There is no global instance and no internal locking; callers
//! serialize access.
//!
//! Every operation validates its input before touching state, so an `Err`
//! leaves the ledger exactly as it was.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::normalize::NormalizationEngine;
use crate::types::{generate_record_id, ExpenseRecord, InventoryEntry, SaleRecord, DEFAULT_UNIT};
use crate::validation::{
    validate_amount, validate_corrected_quantity, validate_key, validate_price, validate_quantity,
};

/// In-memory inventory, sales and expenses.
#[derive(Debug, Clone, Default)]
pub struct LedgerStore {
    normalizer: NormalizationEngine,
    inventory: BTreeMap<String, InventoryEntry>,
    sales: Vec<SaleRecord>,
    expenses: Vec<ExpenseRecord>,
}

impl LedgerStore {
    /// Empty ledger over the built-in vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ledger over a custom normalizer.
    pub fn with_normalizer(normalizer: NormalizationEngine) -> Self {
        LedgerStore {
            normalizer,
            ..Self::default()
        }
    }

    pub fn normalizer(&self) -> &NormalizationEngine {
        &self.normalizer
    }

    // =========================================================================
    // Stock Movements
    // =========================================================================

    /// Adds stock, blending the incoming cost into the weighted average.
    ///
    /// ```text
    /// new_avg = (old_qty * old_avg + qty * cost) / (old_qty + qty)
    /// ```
    /// When the new total is not positive (stocking into a shortfall) the old
    /// average is kept.
    ///
    /// ## Example
    /// ```rust
    /// use dukaan_core::ledger::LedgerStore;
    ///
    /// let mut ledger = LedgerStore::new();
    /// ledger.add_stock("aloo", 10.0, "kg", 2.0).unwrap();
    /// let entry = ledger.add_stock("potatoes", 10.0, "kg", 4.0).unwrap();
    ///
    /// assert_eq!(entry.key, "potato");
    /// assert_eq!(entry.quantity, 20.0);
    /// assert_eq!(entry.avg_cost_per_unit, 3.0);
    /// ```
    pub fn add_stock(
        &mut self,
        item: &str,
        quantity: f64,
        unit: &str,
        cost_per_unit: f64,
    ) -> CoreResult<InventoryEntry> {
        let key = self.normalizer.normalize_item(item);
        validate_key(&key)?;
        validate_quantity(quantity)?;
        validate_price(cost_per_unit)?;

        let unit = unit_or_default(unit);
        let now = Utc::now();

        let entry = self
            .inventory
            .entry(key.clone())
            .and_modify(|entry| {
                let new_total = entry.quantity + quantity;
                if new_total > 0.0 {
                    entry.avg_cost_per_unit = (entry.quantity * entry.avg_cost_per_unit
                        + quantity * cost_per_unit)
                        / new_total;
                }
                entry.quantity = new_total;
                entry.unit = unit.clone();
                entry.last_modified = now;
            })
            .or_insert_with(|| InventoryEntry {
                key: key.clone(),
                quantity,
                unit: unit.clone(),
                avg_cost_per_unit: cost_per_unit,
                last_modified: now,
            })
            .clone();

        info!(
            item = %key,
            quantity,
            on_hand = entry.quantity,
            avg_cost = entry.avg_cost_per_unit,
            "Stock added"
        );

        Ok(entry)
    }

    /// Takes stock out. The result may go negative.
    ///
    /// An unknown key gets an entry with negative quantity, zero cost and
    /// unit `"unit"`, recording the shortfall instead of rejecting it.
    pub fn remove_stock(&mut self, item: &str, quantity: f64) -> CoreResult<InventoryEntry> {
        let key = self.normalizer.normalize_item(item);
        validate_key(&key)?;
        validate_quantity(quantity)?;

        Ok(self.remove_canonical(&key, quantity))
    }

    fn remove_canonical(&mut self, key: &str, quantity: f64) -> InventoryEntry {
        let now = Utc::now();

        let entry = self
            .inventory
            .entry(key.to_string())
            .and_modify(|entry| {
                entry.quantity -= quantity;
                entry.last_modified = now;
            })
            .or_insert_with(|| {
                warn!(item = %key, quantity, "Removing stock that was never added");
                InventoryEntry {
                    key: key.to_string(),
                    quantity: -quantity,
                    unit: DEFAULT_UNIT.to_string(),
                    avg_cost_per_unit: 0.0,
                    last_modified: now,
                }
            })
            .clone();

        if entry.quantity < 0.0 {
            warn!(item = %key, on_hand = entry.quantity, "Stock is negative");
        } else {
            debug!(item = %key, quantity, on_hand = entry.quantity, "Stock removed");
        }

        entry
    }

    /// Corrects an existing entry in place.
    ///
    /// Only the fields given are overwritten; nothing is re-averaged. The
    /// corrected values become the new ground truth.
    ///
    /// ## Errors
    /// - `ItemNotFound` if the key has never been stocked or sold
    pub fn update_stock(
        &mut self,
        item: &str,
        quantity: Option<f64>,
        unit: Option<&str>,
        cost_per_unit: Option<f64>,
    ) -> CoreResult<InventoryEntry> {
        let key = self.normalizer.normalize_item(item);
        validate_key(&key)?;
        if let Some(quantity) = quantity {
            validate_corrected_quantity(quantity)?;
        }
        if let Some(cost) = cost_per_unit {
            validate_price(cost)?;
        }

        let Some(entry) = self.inventory.get_mut(&key) else {
            warn!(item = %key, "Correction for unknown item");
            return Err(CoreError::ItemNotFound(key));
        };

        if let Some(quantity) = quantity {
            entry.quantity = quantity;
        }
        if let Some(unit) = unit.filter(|u| !u.trim().is_empty()) {
            entry.unit = unit.trim().to_string();
        }
        if let Some(cost) = cost_per_unit {
            entry.avg_cost_per_unit = cost;
        }
        entry.last_modified = Utc::now();

        info!(
            item = %key,
            quantity = entry.quantity,
            avg_cost = entry.avg_cost_per_unit,
            "Stock corrected"
        );

        Ok(entry.clone())
    }

    // =========================================================================
    // Sales & Expenses
    // =========================================================================

    /// Records a sale and takes the sold quantity out of stock.
    ///
    /// `total` defaults to `quantity * price_per_unit`. A stated total is kept
    /// as given even when it disagrees with the product.
    pub fn record_sale(
        &mut self,
        item: &str,
        quantity: f64,
        unit: &str,
        price_per_unit: f64,
        total: Option<f64>,
    ) -> CoreResult<SaleRecord> {
        let key = self.normalizer.normalize_item(item);
        validate_key(&key)?;
        validate_quantity(quantity)?;
        validate_price(price_per_unit)?;
        if let Some(total) = total {
            validate_price(total)?;
        }

        let record = SaleRecord {
            id: generate_record_id(),
            item: key.clone(),
            quantity,
            unit: unit_or_default(unit),
            price_per_unit,
            total: total.unwrap_or(quantity * price_per_unit),
            timestamp: Utc::now(),
        };
        self.sales.push(record.clone());

        info!(item = %key, quantity, total = record.total, "Sale recorded");

        self.remove_canonical(&key, quantity);

        Ok(record)
    }

    /// Records an operating expense under its canonical category.
    pub fn record_expense(
        &mut self,
        category: &str,
        amount: f64,
        description: &str,
    ) -> CoreResult<ExpenseRecord> {
        validate_amount(amount)?;

        let record = ExpenseRecord {
            id: generate_record_id(),
            category: self.normalizer.normalize_category(category),
            amount,
            description: description.trim().to_string(),
            timestamp: Utc::now(),
        };
        self.expenses.push(record.clone());

        info!(category = %record.category, amount, "Expense recorded");

        Ok(record)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Entry for one item, by raw or canonical name.
    pub fn get_stock(&self, item: &str) -> Option<InventoryEntry> {
        let key = self.normalizer.normalize_item(item);
        self.inventory.get(&key).cloned()
    }

    /// Snapshot copy of the whole inventory, ordered by key.
    pub fn all_stock(&self) -> BTreeMap<String, InventoryEntry> {
        self.inventory.clone()
    }

    /// Current average cost for a canonical key, or 0 if unknown.
    pub fn avg_cost_of(&self, key: &str) -> f64 {
        self.inventory
            .get(key)
            .map(|entry| entry.avg_cost_per_unit)
            .unwrap_or(0.0)
    }

    pub fn inventory(&self) -> &BTreeMap<String, InventoryEntry> {
        &self.inventory
    }

    /// Sales in insertion (chronological) order.
    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    /// Expenses in insertion (chronological) order.
    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    // =========================================================================
    // Restore
    // =========================================================================
    //
    // Used when loading persisted state. These insert records as they were
    // saved and never re-run side effects (a restored sale does not remove
    // stock a second time).

    /// Puts a persisted inventory entry back, replacing any entry with that key.
    pub fn restore_entry(&mut self, entry: InventoryEntry) {
        self.inventory.insert(entry.key.clone(), entry);
    }

    pub fn restore_sale(&mut self, record: SaleRecord) {
        self.sales.push(record);
    }

    pub fn restore_expense(&mut self, record: ExpenseRecord) {
        self.expenses.push(record);
    }

    /// Starts a new daily window: drops the day's sales and expenses and
    /// keeps the inventory. Returns how many records were dropped.
    pub fn clear_daily_records(&mut self) -> (usize, usize) {
        let dropped = (self.sales.len(), self.expenses.len());
        self.sales.clear();
        self.expenses.clear();
        debug!(sales = dropped.0, expenses = dropped.1, "Daily records cleared");
        dropped
    }
}

fn unit_or_default(unit: &str) -> String {
    let unit = unit.trim();
    if unit.is_empty() {
        DEFAULT_UNIT.to_string()
    } else {
        unit.to_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
