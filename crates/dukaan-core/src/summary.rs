//! # Summary Calculator
//!
//! Aggregates over a ledger snapshot. Nothing here is cached: every call reads
//! the ledger as it is right now.
//!
//! ## Formulas
//! ```text
//! sales     = Σ sale.total
//! expenses  = Σ expense.amount
//! cogs      = Σ sale.quantity × current_avg_cost(sale.item)
//! profit    = sales − cogs − expenses
//! value     = Σ entry.quantity × entry.avg_cost      (quantity > 0 only)
//! low stock = { entry | 0 < entry.quantity ≤ threshold }
//! ```
//!
//! COGS uses the average cost at query time, so restocking at a new price
//! moves the cost basis of sales already recorded today.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerStore;
use crate::types::{DailySummary, ExpenseLine, SoldItem, StockLine};
use crate::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TOP_N};

/// Knobs for summary assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Entries at or below this quantity (and above zero) are low stock.
    pub low_stock_threshold: f64,
    /// How many sellers and expenses to list.
    pub top_n: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Read-only view over a ledger.
#[derive(Debug, Clone, Copy)]
pub struct SummaryCalculator<'a> {
    ledger: &'a LedgerStore,
}

impl<'a> SummaryCalculator<'a> {
    pub fn new(ledger: &'a LedgerStore) -> Self {
        SummaryCalculator { ledger }
    }

    pub fn daily_sales_total(&self) -> f64 {
        self.ledger.sales().iter().map(|sale| sale.total).sum()
    }

    pub fn daily_expense_total(&self) -> f64 {
        self.ledger.expenses().iter().map(|e| e.amount).sum()
    }

    /// Cost of goods sold at the current average cost of each item.
    /// Sales of items with no inventory entry contribute nothing.
    pub fn daily_cogs(&self) -> f64 {
        self.ledger
            .sales()
            .iter()
            .map(|sale| sale.quantity * self.ledger.avg_cost_of(&sale.item))
            .sum()
    }

    /// Sales minus COGS minus expenses. Unsold stock never counts as a loss.
    pub fn daily_profit(&self) -> f64 {
        self.daily_sales_total() - self.daily_cogs() - self.daily_expense_total()
    }

    /// Items with `0 < quantity <= threshold`, formatted as `"potato (3 kg)"`.
    ///
    /// Zero and negative quantities are out of stock, not low stock.
    pub fn low_stock_items(&self, threshold: f64) -> Vec<String> {
        self.ledger
            .inventory()
            .values()
            .filter(|entry| entry.quantity > 0.0 && entry.quantity <= threshold)
            .map(|entry| format!("{} ({} {})", entry.key, entry.quantity, entry.unit))
            .collect()
    }

    pub fn total_inventory_value(&self) -> f64 {
        self.ledger
            .inventory()
            .values()
            .map(|entry| entry.stock_value())
            .sum()
    }

    /// Best sellers by revenue, aggregated per key. The unit is the one on the
    /// key's first sale of the day.
    pub fn top_items(&self, n: usize) -> Vec<SoldItem> {
        let mut sold: Vec<SoldItem> = Vec::new();

        for sale in self.ledger.sales() {
            match sold.iter_mut().find(|s| s.item == sale.item) {
                Some(line) => {
                    line.quantity += sale.quantity;
                    line.revenue += sale.total;
                }
                None => sold.push(SoldItem {
                    item: sale.item.clone(),
                    quantity: sale.quantity,
                    unit: sale.unit.clone(),
                    revenue: sale.total,
                }),
            }
        }

        sold.sort_by(|a, b| descending(a.revenue, b.revenue));
        sold.truncate(n);
        sold
    }

    /// Largest individual expenses.
    pub fn top_expenses(&self, n: usize) -> Vec<ExpenseLine> {
        let mut lines: Vec<ExpenseLine> = self
            .ledger
            .expenses()
            .iter()
            .map(|e| ExpenseLine {
                category: e.category.clone(),
                amount: e.amount,
                description: e.description.clone(),
            })
            .collect();

        lines.sort_by(|a, b| descending(a.amount, b.amount));
        lines.truncate(n);
        lines
    }

    /// Entries with quantity above zero, ordered by key.
    pub fn inventory_remaining(&self) -> Vec<StockLine> {
        self.ledger
            .inventory()
            .values()
            .filter(|entry| entry.quantity > 0.0)
            .map(StockLine::from)
            .collect()
    }

    /// Assembles the full daily view.
    ///
    /// ## Example
    /// ```rust
    /// use dukaan_core::ledger::LedgerStore;
    /// use dukaan_core::summary::{SummaryCalculator, SummaryOptions};
    ///
    /// let mut ledger = LedgerStore::new();
    /// ledger.add_stock("rice", 10.0, "kg", 40.0).unwrap();
    /// ledger.record_sale("rice", 2.0, "kg", 50.0, None).unwrap();
    ///
    /// let summary = SummaryCalculator::new(&ledger)
    ///     .daily_summary("2026-10-19", &SummaryOptions::default());
    /// assert_eq!(summary.total_sales, 100.0);
    /// assert_eq!(summary.profit, 20.0);
    /// ```
    pub fn daily_summary(&self, date: &str, options: &SummaryOptions) -> DailySummary {
        let total_sales = self.daily_sales_total();
        let total_expenses = self.daily_expense_total();
        let cost_of_goods_sold = self.daily_cogs();

        DailySummary {
            date: date.to_string(),
            total_sales,
            total_expenses,
            cost_of_goods_sold,
            profit: total_sales - cost_of_goods_sold - total_expenses,
            items_sold: self.top_items(options.top_n),
            expenses_list: self.top_expenses(options.top_n),
            inventory_remaining: self.inventory_remaining(),
            low_stock_items: self.low_stock_items(options.low_stock_threshold),
            inventory_value: self.total_inventory_value(),
        }
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

// =============================================================================
// Unit Tests
// =============================================================================
