//! # Intent Handler
//!
//! Turns classified intents into ledger operations and reports one
//! [`ActionResult`] per intent.
//!
//! ## Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inventory_in  ──► add_stock        ──► stock_added                    │
//! │  inventory_out ──► remove_stock     ──► stock_removed                  │
//! │  sale          ──► record_sale      ──► sale_recorded                  │
//! │  expense       ──► record_expense   ──► expense_recorded               │
//! │  correction    ──► update_stock     ──► correction                     │
//! │  query_stock   ──► get_stock        ──► stock_info | full_stock        │
//! │  query_summary ┐                                                        │
//! │  close_day     ┴─► SummaryCalculator ──► summary                       │
//! │  query_profit  ──► SummaryCalculator ──► profit                        │
//! │  greeting / unknown                 ──► greeting / unknown             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Missing prices and totals are derived from whatever the speaker did say.
//! Each intent is handled on its own: a failure becomes an `error` result and
//! the rest of the batch still runs.

use tracing::{debug, warn};

use crate::error::CoreError;
use crate::intent::{IntentBatch, IntentKind, IntentRecord};
use crate::ledger::LedgerStore;
use crate::result::{ActionResult, BatchOutcome, ErrorTag, LowStockAlert};
use crate::summary::{SummaryCalculator, SummaryOptions};
use crate::types::{today_label, StockLine};

/// Unit reported for a stock query on an item the ledger does not know.
const UNKNOWN_UNIT: &str = "unknown";

/// Category used when an expense names none.
const DEFAULT_CATEGORY: &str = "other";

// =============================================================================
// Handler Options
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOptions {
    pub summary: SummaryOptions,
    /// Day label stamped on summaries.
    pub date: String,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            summary: SummaryOptions::default(),
            date: today_label(),
        }
    }
}

impl HandlerOptions {
    pub fn new(summary: SummaryOptions, date: impl Into<String>) -> Self {
        HandlerOptions {
            summary,
            date: date.into(),
        }
    }
}

// =============================================================================
// Intent Handler
// =============================================================================

/// Applies intents to a borrowed ledger.
pub struct IntentHandler<'a> {
    ledger: &'a mut LedgerStore,
    options: HandlerOptions,
}

impl<'a> IntentHandler<'a> {
    pub fn new(ledger: &'a mut LedgerStore, options: HandlerOptions) -> Self {
        IntentHandler { ledger, options }
    }

    /// Handles every intent in order, then checks low stock once.
    pub fn handle_batch(&mut self, batch: &IntentBatch) -> BatchOutcome {
        let results = batch
            .intents
            .iter()
            .map(|intent| self.handle(intent))
            .collect();

        let threshold = self.options.summary.low_stock_threshold;
        let alerts = LowStockAlert {
            items: SummaryCalculator::new(&*self.ledger).low_stock_items(threshold),
            threshold,
        };

        BatchOutcome { results, alerts }
    }

    /// Handles a single intent. Never fails; problems come back as
    /// [`ActionResult::Error`].
    pub fn handle(&mut self, intent: &IntentRecord) -> ActionResult {
        debug!(intent = %intent.intent, confidence = intent.confidence, "Handling intent");

        if let Err(err) = intent.validate() {
            warn!(intent = %intent.intent, error = %err, "Rejected intent");
            return ActionResult::error(success_action(intent.intent), ErrorTag::InvalidInput);
        }

        let result = match intent.intent {
            IntentKind::InventoryIn => self.stock_in(intent),
            IntentKind::InventoryOut => self.stock_out(intent),
            IntentKind::Sale => self.sale(intent),
            IntentKind::Expense => self.expense(intent),
            IntentKind::Correction => self.correction(intent),
            IntentKind::QueryStock => self.query_stock(intent),
            IntentKind::QuerySummary => self.summary(false),
            IntentKind::CloseDay => self.summary(true),
            IntentKind::QueryProfit => self.profit(),
            IntentKind::Greeting => ActionResult::Greeting,
            IntentKind::Unknown => ActionResult::Unknown {
                intent: intent.intent.to_string(),
            },
        };

        if let ActionResult::Error { error, .. } = &result {
            warn!(intent = %intent.intent, error = ?error, "Intent not applied");
        }

        result
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn stock_in(&mut self, intent: &IntentRecord) -> ActionResult {
        let failed = success_action(intent.intent);
        let (Some(item), Some(quantity)) = (intent.item_name(), intent.quantity) else {
            return missing_data(failed, intent);
        };

        let cost = intent
            .price_per_unit
            .or_else(|| per_unit(intent.total_amount, quantity))
            .unwrap_or(0.0);
        let total_value = intent.total_amount.unwrap_or(quantity * cost);

        match self.ledger.add_stock(item, quantity, intent.unit_or_empty(), cost) {
            Ok(entry) => ActionResult::StockAdded {
                item: entry.key,
                quantity,
                unit: entry.unit.clone(),
                price_per_unit: cost,
                total_value,
                current_stock: entry.quantity,
                current_unit: entry.unit,
            },
            Err(err) => failure(failed, &err, intent),
        }
    }

    fn stock_out(&mut self, intent: &IntentRecord) -> ActionResult {
        let failed = success_action(intent.intent);
        let (Some(item), Some(quantity)) = (intent.item_name(), intent.quantity) else {
            return missing_data(failed, intent);
        };

        match self.ledger.remove_stock(item, quantity) {
            Ok(entry) => ActionResult::StockRemoved {
                item: entry.key,
                quantity,
                current_stock: entry.quantity,
                unit: entry.unit,
            },
            Err(err) => failure(failed, &err, intent),
        }
    }

    fn sale(&mut self, intent: &IntentRecord) -> ActionResult {
        let failed = success_action(intent.intent);
        let (Some(item), Some(quantity)) = (intent.item_name(), intent.quantity) else {
            return missing_data(failed, intent);
        };
        if quantity <= 0.0 {
            return missing_data(failed, intent);
        }

        let total = intent
            .total_amount
            .or_else(|| intent.price_per_unit.map(|price| quantity * price))
            .unwrap_or(0.0);
        let price = intent
            .price_per_unit
            .unwrap_or(if total > 0.0 { total / quantity } else { 0.0 });

        let sale = match self
            .ledger
            .record_sale(item, quantity, intent.unit_or_empty(), price, Some(total))
        {
            Ok(sale) => sale,
            Err(err) => return failure(failed, &err, intent),
        };

        let remaining = self.ledger.inventory().get(&sale.item);
        ActionResult::SaleRecorded {
            quantity: sale.quantity,
            unit: sale.unit,
            price_per_unit: sale.price_per_unit,
            revenue: sale.total,
            remaining_stock: remaining.map(|e| e.quantity).unwrap_or(0.0),
            remaining_unit: remaining
                .map(|e| e.unit.clone())
                .unwrap_or_else(|| crate::types::DEFAULT_UNIT.to_string()),
            daily_sales_total: SummaryCalculator::new(&*self.ledger).daily_sales_total(),
            item: sale.item,
        }
    }

    fn expense(&mut self, intent: &IntentRecord) -> ActionResult {
        let failed = success_action(intent.intent);
        let category = intent.category.as_deref().unwrap_or(DEFAULT_CATEGORY);

        let Some(amount) = intent.total_amount.filter(|amount| *amount > 0.0) else {
            return ActionResult::Error {
                failed_action: failed.to_string(),
                error: ErrorTag::MissingAmount,
                item: None,
                category: Some(category.to_string()),
            };
        };

        let description = intent.description.as_deref().unwrap_or("");
        match self.ledger.record_expense(category, amount, description) {
            Ok(record) => ActionResult::ExpenseRecorded {
                category: record.category,
                amount: record.amount,
                description: record.description,
                daily_expense_total: SummaryCalculator::new(&*self.ledger).daily_expense_total(),
            },
            Err(err) => failure(failed, &err, intent),
        }
    }

    fn correction(&mut self, intent: &IntentRecord) -> ActionResult {
        let failed = success_action(intent.intent);
        let Some(item) = intent.item_name() else {
            return missing_data(failed, intent);
        };

        let cost = intent.price_per_unit.or_else(|| {
            intent
                .quantity
                .and_then(|quantity| per_unit(intent.total_amount, quantity))
        });

        match self
            .ledger
            .update_stock(item, intent.quantity, intent.unit.as_deref(), cost)
        {
            Ok(entry) => ActionResult::Correction {
                item: entry.key,
                quantity: entry.quantity,
                unit: entry.unit,
                price_per_unit: entry.avg_cost_per_unit,
            },
            Err(err) => failure(failed, &err, intent),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn query_stock(&self, intent: &IntentRecord) -> ActionResult {
        match intent.item_name() {
            Some(item) => match self.ledger.get_stock(item) {
                Some(entry) => ActionResult::StockInfo {
                    item: entry.key,
                    quantity: entry.quantity,
                    unit: entry.unit,
                    found: true,
                },
                None => ActionResult::StockInfo {
                    item: self.ledger.normalizer().normalize_item(item),
                    quantity: 0.0,
                    unit: UNKNOWN_UNIT.to_string(),
                    found: false,
                },
            },
            None => {
                let items: Vec<StockLine> =
                    self.ledger.inventory().values().map(StockLine::from).collect();
                ActionResult::FullStock {
                    total_items: items.len(),
                    items,
                }
            }
        }
    }

    fn summary(&self, is_closing: bool) -> ActionResult {
        let summary = SummaryCalculator::new(&*self.ledger)
            .daily_summary(&self.options.date, &self.options.summary);
        ActionResult::Summary {
            summary,
            is_closing,
        }
    }

    fn profit(&self) -> ActionResult {
        let calc = SummaryCalculator::new(&*self.ledger);
        let total_sales = calc.daily_sales_total();
        let cost_of_goods_sold = calc.daily_cogs();
        let total_expenses = calc.daily_expense_total();

        ActionResult::Profit {
            total_sales,
            cost_of_goods_sold,
            total_expenses,
            profit: total_sales - cost_of_goods_sold - total_expenses,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// The action tag an intent reports when it succeeds.
fn success_action(kind: IntentKind) -> &'static str {
    match kind {
        IntentKind::InventoryIn => "stock_added",
        IntentKind::InventoryOut => "stock_removed",
        IntentKind::Sale => "sale_recorded",
        IntentKind::Expense => "expense_recorded",
        IntentKind::Correction => "correction",
        IntentKind::QueryStock => "stock_info",
        IntentKind::QuerySummary | IntentKind::CloseDay => "summary",
        IntentKind::QueryProfit => "profit",
        IntentKind::Greeting => "greeting",
        IntentKind::Unknown => "unknown",
    }
}

/// `total / quantity`, when both make sense.
fn per_unit(total: Option<f64>, quantity: f64) -> Option<f64> {
    total.filter(|_| quantity != 0.0).map(|total| total / quantity)
}

fn missing_data(failed_action: &str, intent: &IntentRecord) -> ActionResult {
    failure(failed_action, &CoreError::missing("item/quantity"), intent)
}

fn failure(failed_action: &str, err: &CoreError, intent: &IntentRecord) -> ActionResult {
    ActionResult::Error {
        failed_action: failed_action.to_string(),
        error: ErrorTag::from(err),
        item: intent.item.clone(),
        category: intent.category.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> HandlerOptions {
        HandlerOptions::new(SummaryOptions::default(), "2026-10-19")
    }

    fn handle(ledger: &mut LedgerStore, intent: IntentRecord) -> ActionResult {
        IntentHandler::new(ledger, options()).handle(&intent)
    }

    fn error_tag(result: &ActionResult) -> Option<ErrorTag> {
        match result {
            ActionResult::Error { error, .. } => Some(*error),
            _ => None,
        }
    }

    #[test]
    fn test_stock_in_derives_cost_from_total() {
        let mut ledger = LedgerStore::new();
        let intent = IntentRecord::new(IntentKind::InventoryIn)
            .with_item("aloo")
            .with_quantity(10.0, "kg")
            .with_total(200.0);

        match handle(&mut ledger, intent) {
            ActionResult::StockAdded {
                item,
                price_per_unit,
                total_value,
                current_stock,
                ..
            } => {
                assert_eq!(item, "potato");
                assert_eq!(price_per_unit, 20.0);
                assert_eq!(total_value, 200.0);
                assert_eq!(current_stock, 10.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_stock_in_derives_total_from_price() {
        let mut ledger = LedgerStore::new();
        let intent = IntentRecord::new(IntentKind::InventoryIn)
            .with_item("rice")
            .with_quantity(5.0, "kg")
            .with_price(40.0);

        match handle(&mut ledger, intent) {
            ActionResult::StockAdded { total_value, .. } => assert_eq!(total_value, 200.0),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_stock_in_without_quantity_is_missing_data() {
        let mut ledger = LedgerStore::new();
        let result = handle(&mut ledger, IntentRecord::new(IntentKind::InventoryIn).with_item("rice"));

        assert_eq!(error_tag(&result), Some(ErrorTag::MissingData));
        assert!(ledger.inventory().is_empty());
    }

    #[test]
    fn test_sale_derives_price_from_total() {
        let mut ledger = LedgerStore::new();
        ledger.add_stock("sugar", 10.0, "kg", 40.0).unwrap();
        let intent = IntentRecord::new(IntentKind::Sale)
            .with_item("cheeni")
            .with_quantity(2.0, "kg")
            .with_total(90.0);

        match handle(&mut ledger, intent) {
            ActionResult::SaleRecorded {
                item,
                price_per_unit,
                revenue,
                remaining_stock,
                daily_sales_total,
                ..
            } => {
                assert_eq!(item, "sugar");
                assert_eq!(price_per_unit, 45.0);
                assert_eq!(revenue, 90.0);
                assert_eq!(remaining_stock, 8.0);
                assert_eq!(daily_sales_total, 90.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_sale_without_price_or_total_records_zero() {
        let mut ledger = LedgerStore::new();
        let intent = IntentRecord::new(IntentKind::Sale).with_item("salt").with_quantity(1.0, "");

        match handle(&mut ledger, intent) {
            ActionResult::SaleRecorded {
                revenue,
                price_per_unit,
                remaining_stock,
                remaining_unit,
                ..
            } => {
                assert_eq!(revenue, 0.0);
                assert_eq!(price_per_unit, 0.0);
                assert_eq!(remaining_stock, -1.0);
                assert_eq!(remaining_unit, "unit");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_sale_of_zero_quantity_is_missing_data() {
        let mut ledger = LedgerStore::new();
        let intent = IntentRecord::new(IntentKind::Sale)
            .with_item("rice")
            .with_quantity(0.0, "kg")
            .with_total(50.0);

        assert_eq!(error_tag(&handle(&mut ledger, intent)), Some(ErrorTag::MissingData));
        assert!(ledger.sales().is_empty());
    }

    #[test]
    fn test_expense_requires_amount() {
        let mut ledger = LedgerStore::new();
        let result = handle(&mut ledger, IntentRecord::new(IntentKind::Expense).with_category("bijli"));

        match result {
            ActionResult::Error { error, category, .. } => {
                assert_eq!(error, ErrorTag::MissingAmount);
                assert_eq!(category.as_deref(), Some("bijli"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(ledger.expenses().is_empty());
    }

    #[test]
    fn test_expense_defaults() {
        let mut ledger = LedgerStore::new();
        let result = handle(&mut ledger, IntentRecord::new(IntentKind::Expense).with_total(75.0));

        match result {
            ActionResult::ExpenseRecorded {
                category,
                description,
                daily_expense_total,
                ..
            } => {
                assert_eq!(category, "other");
                assert_eq!(description, "");
                assert_eq!(daily_expense_total, 75.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_correction_of_unknown_item() {
        let mut ledger = LedgerStore::new();
        let intent = IntentRecord::new(IntentKind::Correction)
            .with_item("bhindi")
            .with_quantity(7.0, "kg");

        assert_eq!(error_tag(&handle(&mut ledger, intent)), Some(ErrorTag::ItemNotFound));
    }

    #[test]
    fn test_correction_sets_quantity_and_cost() {
        let mut ledger = LedgerStore::new();
        ledger.add_stock("rice", 10.0, "kg", 40.0).unwrap();
        let intent = IntentRecord::new(IntentKind::Correction)
            .with_item("chawal")
            .with_quantity(8.0, "kg")
            .with_total(360.0);

        match handle(&mut ledger, intent) {
            ActionResult::Correction {
                quantity,
                price_per_unit,
                ..
            } => {
                assert_eq!(quantity, 8.0);
                assert_eq!(price_per_unit, 45.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_query_stock_variants() {
        let mut ledger = LedgerStore::new();
        ledger.add_stock("rice", 10.0, "kg", 40.0).unwrap();
        ledger.add_stock("oil", 2.0, "litre", 120.0).unwrap();

        let known = handle(&mut ledger, IntentRecord::new(IntentKind::QueryStock).with_item("chawal"));
        assert_eq!(
            known,
            ActionResult::StockInfo {
                item: "rice".into(),
                quantity: 10.0,
                unit: "kg".into(),
                found: true
            }
        );

        let unknown = handle(&mut ledger, IntentRecord::new(IntentKind::QueryStock).with_item("saffron"));
        assert_eq!(
            unknown,
            ActionResult::StockInfo {
                item: "saffron".into(),
                quantity: 0.0,
                unit: "unknown".into(),
                found: false
            }
        );

        match handle(&mut ledger, IntentRecord::new(IntentKind::QueryStock)) {
            ActionResult::FullStock { items, total_items } => {
                assert_eq!(total_items, 2);
                assert_eq!(items[0].item, "oil");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_close_day_and_profit() {
        let mut ledger = LedgerStore::new();
        ledger.add_stock("rice", 10.0, "kg", 20.0).unwrap();
        ledger.record_sale("rice", 10.0, "kg", 50.0, None).unwrap();
        ledger.record_expense("rent", 50.0, "").unwrap();

        match handle(&mut ledger, IntentRecord::new(IntentKind::CloseDay)) {
            ActionResult::Summary { summary, is_closing } => {
                assert!(is_closing);
                assert_eq!(summary.date, "2026-10-19");
                assert_eq!(summary.profit, 250.0);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(
            handle(&mut ledger, IntentRecord::new(IntentKind::QueryProfit)),
            ActionResult::Profit {
                total_sales: 500.0,
                cost_of_goods_sold: 200.0,
                total_expenses: 50.0,
                profit: 250.0
            }
        );
    }

    #[test]
    fn test_invalid_confidence_is_rejected() {
        let mut ledger = LedgerStore::new();
        let mut intent = IntentRecord::new(IntentKind::Sale).with_item("rice").with_quantity(1.0, "kg");
        intent.confidence = 2.0;

        assert_eq!(error_tag(&handle(&mut ledger, intent)), Some(ErrorTag::InvalidInput));
        assert!(ledger.sales().is_empty());
    }

    #[test]
    fn test_batch_continues_after_error() {
        let mut ledger = LedgerStore::new();
        let batch = IntentBatch::new(vec![
            IntentRecord::new(IntentKind::InventoryIn)
                .with_item("rice")
                .with_quantity(6.0, "kg")
                .with_price(40.0),
            IntentRecord::new(IntentKind::Expense),
            IntentRecord::new(IntentKind::Sale)
                .with_item("rice")
                .with_quantity(2.0, "kg")
                .with_price(50.0),
            IntentRecord::new(IntentKind::Greeting),
            IntentRecord::new(IntentKind::Unknown),
        ]);

        let outcome = IntentHandler::new(&mut ledger, options()).handle_batch(&batch);

        let actions: Vec<&str> = outcome.results.iter().map(ActionResult::action).collect();
        assert_eq!(actions, vec!["stock_added", "error", "sale_recorded", "greeting", "unknown"]);
        assert_eq!(outcome.alerts.items, vec!["rice (4 kg)".to_string()]);
        assert_eq!(outcome.alerts.threshold, 5.0);
    }
}
