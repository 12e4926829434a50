//! # Persistence Sync
//!
//! Flushes the in-memory ledger to SQLite after each unit of work and restores
//! the current day on startup.
//!
//! ## Watermarks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ledger.sales()   [ s0 s1 s2 s3 | s4 s5 ]                              │
//! │                                 ▲                                       │
//! │                          sales watermark = 4                            │
//! │                                                                         │
//! │  save():                                                                │
//! │    BEGIN                                                                │
//! │      upsert every inventory entry                                      │
//! │      append s4, s5 (and expenses past their watermark)                 │
//! │    COMMIT                                                               │
//! │    watermark = 6            ← only after the commit succeeded          │
//! │                                                                         │
//! │  A failed or timed-out save rolls back and leaves the watermarks        │
//! │  where they were; the next save sends the same tail again.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Load
//! Inventory is restored in full. Sales and expenses are restored for the
//! current day label only. Each collection loads independently: a broken
//! table is reported in [`LoadReport`] and the other two still come back.
//!
//! ## Held Inventory
//! Stored inventory that was not read back must not be overwritten by the
//! in-memory ledger, which knows nothing about it. After a load, keys whose
//! rows failed to decode are held; if the inventory table could not be read
//! at all, every key is held. Held entries are skipped by `save` (sales and
//! expenses are still appended) until a later load restores them.
//!
//! ## Day Rollover
//! [`PersistenceSync::roll_day`] flushes the finished day under its own label,
//! clears the ledger's daily records and continues under the new label.

use std::collections::BTreeSet;
use std::future::Future;

use tracing::{error, info, warn};

use dukaan_core::{today_label, ExpenseRecord, InventoryEntry, LedgerStore, SaleRecord};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::expense::ExpenseRepository;
use crate::repository::inventory::{InventoryRepository, RejectedRow};
use crate::repository::sale::SaleRepository;

// =============================================================================
// Reports
// =============================================================================

/// What one successful save wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub inventory_upserted: usize,
    /// Entries skipped because their stored rows were never restored.
    pub inventory_held: usize,
    pub sales_appended: usize,
    pub expenses_appended: usize,
}

impl SaveReport {
    /// Whether any sale or expense row was appended.
    pub fn appended_anything(&self) -> bool {
        self.sales_appended > 0 || self.expenses_appended > 0
    }
}

/// Outcome of a load, one result per collection (count restored on success).
#[derive(Debug)]
pub struct LoadReport {
    pub inventory: DbResult<usize>,
    /// Inventory rows that were skipped because they did not decode.
    pub inventory_rejected: Vec<RejectedRow>,
    pub sales: DbResult<usize>,
    pub expenses: DbResult<usize>,
}

impl LoadReport {
    /// Every collection loaded and every inventory row decoded.
    pub fn is_complete(&self) -> bool {
        self.inventory.is_ok()
            && self.inventory_rejected.is_empty()
            && self.sales.is_ok()
            && self.expenses.is_ok()
    }

    /// Nothing loaded at all.
    pub fn is_total_failure(&self) -> bool {
        self.inventory.is_err() && self.sales.is_err() && self.expenses.is_err()
    }
}

// =============================================================================
// Inventory Hold
// =============================================================================

/// Stored inventory keys that `save` must leave alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum InventoryHold {
    #[default]
    None,
    Keys(BTreeSet<String>),
    All,
}

impl InventoryHold {
    fn after_load(inventory: &DbResult<usize>, rejected: &[RejectedRow]) -> Self {
        if inventory.is_err() {
            return InventoryHold::All;
        }

        let mut keys = BTreeSet::new();
        for row in rejected {
            match &row.key {
                Some(key) => keys.insert(key.clone()),
                None => return InventoryHold::All,
            };
        }

        if keys.is_empty() {
            InventoryHold::None
        } else {
            InventoryHold::Keys(keys)
        }
    }

    fn allows(&self, key: &str) -> bool {
        match self {
            InventoryHold::None => true,
            InventoryHold::Keys(keys) => !keys.contains(key),
            InventoryHold::All => false,
        }
    }
}

// =============================================================================
// Persistence Sync
// =============================================================================

/// Watermark-based incremental persistence for one [`LedgerStore`].
///
/// Holds no ledger state of its own besides the two watermarks: the number
/// of leading sales and expenses already written.
#[derive(Debug)]
pub struct PersistenceSync {
    db: Database,
    day: String,
    sales_watermark: usize,
    expenses_watermark: usize,
    hold: InventoryHold,
}

impl PersistenceSync {
    /// Sync for the shop's current local day.
    pub fn new(db: Database) -> Self {
        PersistenceSync {
            db,
            day: today_label(),
            sales_watermark: 0,
            expenses_watermark: 0,
            hold: InventoryHold::None,
        }
    }

    /// Overrides the day label rows are saved under and loaded by.
    pub fn with_day(mut self, day: impl Into<String>) -> Self {
        self.day = day.into();
        self
    }

    pub fn day(&self) -> &str {
        &self.day
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// `(sales, expenses)` already persisted.
    pub fn watermarks(&self) -> (usize, usize) {
        (self.sales_watermark, self.expenses_watermark)
    }

    /// Whether the last load left stored inventory that `save` skips.
    pub fn inventory_held(&self) -> bool {
        self.hold != InventoryHold::None
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Writes the ledger's inventory and any records past the watermarks.
    ///
    /// ## Errors
    /// - `DbError::Timeout` if the write exceeds the I/O timeout
    /// - Any database error from the transaction
    ///
    /// On error nothing is committed and the watermarks do not move.
    pub async fn save(&mut self, ledger: &LedgerStore) -> DbResult<SaveReport> {
        let new_sales = ledger.sales().get(self.sales_watermark..).unwrap_or_default();
        let new_expenses = ledger
            .expenses()
            .get(self.expenses_watermark..)
            .unwrap_or_default();

        let held = ledger
            .inventory()
            .keys()
            .filter(|key| !self.hold.allows(key))
            .count();
        if held > 0 {
            warn!(held, "Skipping inventory entries whose stored rows were not restored");
        }

        let inventory = ledger
            .inventory()
            .values()
            .filter(|entry| self.hold.allows(&entry.key));
        let write = self.write(inventory, new_sales, new_expenses);
        let report = match self.bounded("save", write).await {
            Ok(report) => SaveReport {
                inventory_held: held,
                ..report
            },
            Err(err) => {
                error!(error = %err, retryable = err.is_retryable(), "Ledger save failed");
                return Err(err);
            }
        };

        self.sales_watermark += new_sales.len();
        self.expenses_watermark += new_expenses.len();

        info!(
            day = %self.day,
            inventory = report.inventory_upserted,
            sales = report.sales_appended,
            expenses = report.expenses_appended,
            "Ledger saved"
        );

        Ok(report)
    }

    async fn write<'a>(
        &self,
        inventory: impl Iterator<Item = &'a InventoryEntry>,
        sales: &[SaleRecord],
        expenses: &[ExpenseRecord],
    ) -> DbResult<SaveReport> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut report = SaveReport::default();

        for entry in inventory {
            InventoryRepository::upsert_with(&mut tx, entry).await?;
            report.inventory_upserted += 1;
        }

        for record in sales {
            if SaleRepository::append_with(&mut tx, record, &self.day).await? {
                report.sales_appended += 1;
            }
        }

        for record in expenses {
            if ExpenseRepository::append_with(&mut tx, record, &self.day).await? {
                report.expenses_appended += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(report)
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Restores persisted state into `ledger`.
    ///
    /// Meant for a fresh ledger at startup: afterwards the watermarks equal
    /// the ledger's record counts, so the restored rows are not re-appended.
    /// Restoring never re-runs side effects such as stock removal for sales.
    pub async fn load(&mut self, ledger: &mut LedgerStore) -> LoadReport {
        if !ledger.sales().is_empty() || !ledger.expenses().is_empty() {
            warn!("Loading into a ledger that already holds records");
        }

        let mut inventory_rejected = Vec::new();
        let inventory = self.bounded("load inventory", self.db.inventory().list()).await;
        let inventory = inventory.map(|rows| {
            let count = rows.entries.len();
            rows.entries.into_iter().for_each(|e| ledger.restore_entry(e));
            inventory_rejected = rows.rejected;
            count
        });
        self.hold = InventoryHold::after_load(&inventory, &inventory_rejected);

        let sales = self
            .bounded("load sales", self.db.sales().list_for_day(&self.day))
            .await;
        let sales = sales.map(|records| {
            let count = records.len();
            records.into_iter().for_each(|r| ledger.restore_sale(r));
            count
        });

        let expenses = self
            .bounded("load expenses", self.db.expenses().list_for_day(&self.day))
            .await;
        let expenses = expenses.map(|records| {
            let count = records.len();
            records.into_iter().for_each(|r| ledger.restore_expense(r));
            count
        });

        self.sales_watermark = ledger.sales().len();
        self.expenses_watermark = ledger.expenses().len();

        let report = LoadReport {
            inventory,
            inventory_rejected,
            sales,
            expenses,
        };

        for (collection, result) in [
            ("inventory", &report.inventory),
            ("sales", &report.sales),
            ("expenses", &report.expenses),
        ] {
            match result {
                Ok(count) => info!(day = %self.day, collection, count, "Restored"),
                Err(err) => error!(day = %self.day, collection, error = %err, "Failed to restore"),
            }
        }

        match &self.hold {
            InventoryHold::None => {}
            InventoryHold::Keys(keys) => {
                warn!(?keys, "Holding inventory rows that failed to decode")
            }
            InventoryHold::All => warn!("Inventory not restored; holding all inventory writes"),
        }

        report
    }

    // =========================================================================
    // Day Rollover
    // =========================================================================

    /// Moves the daily window to `day`.
    ///
    /// Saves what is pending under the current label first; if that fails
    /// nothing changes and the error is returned. On success the ledger's
    /// sales and expenses are cleared, inventory is kept, and the watermarks
    /// restart at zero. Returns false when `day` is already current.
    pub async fn roll_day(
        &mut self,
        ledger: &mut LedgerStore,
        day: impl Into<String>,
    ) -> DbResult<bool> {
        let day = day.into();
        if day == self.day {
            return Ok(false);
        }

        self.save(ledger).await?;
        let (sales, expenses) = ledger.clear_daily_records();

        info!(from = %self.day, to = %day, sales, expenses, "Day rolled over");
        self.day = day;
        self.sales_watermark = 0;
        self.expenses_watermark = 0;

        Ok(true)
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = DbResult<T>>,
    ) -> DbResult<T> {
        let limit = self.db.io_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(DbError::timeout(operation, limit)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::pool::DbConfig;

    const DAY: &str = "2026-10-19";

    async fn sync() -> PersistenceSync {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        PersistenceSync::new(db).with_day(DAY)
    }

    fn busy_ledger() -> LedgerStore {
        let mut ledger = LedgerStore::new();
        ledger.add_stock("rice", 10.0, "kg", 40.0).unwrap();
        ledger.add_stock("oil", 4.0, "litre", 120.0).unwrap();
        ledger.record_sale("rice", 3.0, "kg", 50.0, None).unwrap();
        ledger.record_expense("bijli", 200.0, "").unwrap();
        ledger
    }

    #[tokio::test]
    async fn test_second_save_appends_nothing() {
        let mut sync = sync().await;
        let ledger = busy_ledger();

        let first = sync.save(&ledger).await.unwrap();
        assert_eq!(first.inventory_upserted, 2);
        assert_eq!(first.sales_appended, 1);
        assert_eq!(first.expenses_appended, 1);

        let second = sync.save(&ledger).await.unwrap();
        assert!(!second.appended_anything());
        assert_eq!(second.inventory_upserted, 2);

        let db = sync.database();
        assert_eq!(db.sales().count_for_day(DAY).await.unwrap(), 1);
        assert_eq!(db.expenses().count_for_day(DAY).await.unwrap(), 1);
        assert_eq!(sync.watermarks(), (1, 1));
    }

    #[tokio::test]
    async fn test_save_appends_only_the_tail() {
        let mut sync = sync().await;
        let mut ledger = busy_ledger();
        sync.save(&ledger).await.unwrap();

        ledger.record_sale("oil", 1.0, "litre", 130.0, None).unwrap();
        ledger.record_sale("rice", 1.0, "kg", 50.0, None).unwrap();

        let report = sync.save(&ledger).await.unwrap();
        assert_eq!(report.sales_appended, 2);
        assert_eq!(report.expenses_appended, 0);
        assert_eq!(sync.database().sales().count_for_day(DAY).await.unwrap(), 3);

        let oil = sync.database().inventory().get("oil").await.unwrap().unwrap();
        assert_eq!(oil.quantity, 3.0);
    }

    #[tokio::test]
    async fn test_load_restores_state_without_side_effects() {
        let mut sync = sync().await;
        let original = busy_ledger();
        sync.save(&original).await.unwrap();

        let db = sync.database().clone();
        let mut restarted = PersistenceSync::new(db).with_day(DAY);
        let mut ledger = LedgerStore::new();
        let report = restarted.load(&mut ledger).await;

        assert!(report.is_complete());
        assert_eq!(report.inventory.as_ref().ok(), Some(&2));
        assert_eq!(ledger.get_stock("rice").unwrap().quantity, 7.0);
        assert_eq!(ledger.sales().len(), 1);
        assert_eq!(ledger.sales()[0].id, original.sales()[0].id);
        assert_eq!(ledger.expenses()[0].category, "electricity");
        assert_eq!(restarted.watermarks(), (1, 1));

        let report = restarted.save(&ledger).await.unwrap();
        assert!(!report.appended_anything());
    }

    #[tokio::test]
    async fn test_load_skips_other_days() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut yesterday = PersistenceSync::new(db.clone()).with_day("2026-10-18");
        yesterday.save(&busy_ledger()).await.unwrap();

        let mut today = PersistenceSync::new(db).with_day(DAY);
        let mut ledger = LedgerStore::new();
        let report = today.load(&mut ledger).await;

        assert!(report.is_complete());
        assert!(ledger.sales().is_empty());
        assert!(ledger.expenses().is_empty());
        // inventory carries over across days
        assert_eq!(ledger.get_stock("oil").unwrap().quantity, 4.0);
        assert_eq!(today.watermarks(), (0, 0));
    }

    #[tokio::test]
    async fn test_broken_table_does_not_block_others() {
        let mut sync = sync().await;
        sync.save(&busy_ledger()).await.unwrap();

        sqlx::query("DROP TABLE expenses")
            .execute(sync.database().pool())
            .await
            .unwrap();

        let mut ledger = LedgerStore::new();
        let report = sync.load(&mut ledger).await;

        assert!(report.inventory.is_ok());
        assert!(report.sales.is_ok());
        assert!(report.expenses.is_err());
        assert!(!report.is_complete());
        assert!(!report.is_total_failure());
        assert_eq!(ledger.sales().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_watermarks() {
        let mut sync = sync().await;
        let ledger = busy_ledger();

        sqlx::query("DROP TABLE sales")
            .execute(sync.database().pool())
            .await
            .unwrap();

        assert!(sync.save(&ledger).await.is_err());
        assert_eq!(sync.watermarks(), (0, 0));
        // the inventory upsert was rolled back with the rest
        assert_eq!(sync.database().inventory().count().await.unwrap(), 0);
    }

    async fn insert_corrupt_oil_row(db: &Database) {
        sqlx::query(
            "INSERT INTO inventory (item_key, quantity, unit, avg_cost, updated_at) \
             VALUES ('oil', 4, 'litre', 120, 'garbage')",
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn stored_oil_quantity(db: &Database) -> f64 {
        sqlx::query_scalar("SELECT quantity FROM inventory WHERE item_key = 'oil'")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_undecodable_row_is_held_and_valid_rows_still_sync() {
        let mut first = sync().await;
        let mut stocked = LedgerStore::new();
        stocked.add_stock("rice", 20.0, "kg", 40.0).unwrap();
        first.save(&stocked).await.unwrap();
        insert_corrupt_oil_row(first.database()).await;

        let mut restarted = PersistenceSync::new(first.database().clone()).with_day(DAY);
        let mut ledger = LedgerStore::new();
        let report = restarted.load(&mut ledger).await;

        assert_eq!(report.inventory.as_ref().ok(), Some(&1));
        assert_eq!(report.inventory_rejected.len(), 1);
        assert_eq!(report.inventory_rejected[0].key.as_deref(), Some("oil"));
        assert!(!report.is_complete());
        assert!(restarted.inventory_held());

        ledger.record_sale("rice", 5.0, "kg", 50.0, None).unwrap();
        ledger.record_sale("oil", 1.0, "litre", 130.0, None).unwrap();

        let saved = restarted.save(&ledger).await.unwrap();
        assert_eq!(saved.inventory_upserted, 1);
        assert_eq!(saved.inventory_held, 1);
        assert_eq!(saved.sales_appended, 2);

        let db = restarted.database();
        let rice = db.inventory().get("rice").await.unwrap().unwrap();
        assert_eq!(rice.quantity, 15.0);
        assert_eq!(rice.avg_cost_per_unit, 40.0);
        // the unrestored row is left exactly as stored
        assert_eq!(stored_oil_quantity(db).await, 4.0);
    }

    #[tokio::test]
    async fn test_clean_reload_releases_hold() {
        let mut sync = sync().await;
        insert_corrupt_oil_row(sync.database()).await;

        let mut ledger = LedgerStore::new();
        sync.load(&mut ledger).await;
        assert!(sync.inventory_held());

        sqlx::query("DELETE FROM inventory WHERE item_key = 'oil'")
            .execute(sync.database().pool())
            .await
            .unwrap();

        let report = sync.load(&mut LedgerStore::new()).await;
        assert!(report.is_complete());
        assert!(!sync.inventory_held());
    }

    #[tokio::test]
    async fn test_unreadable_inventory_holds_every_entry() {
        let mut sync = sync().await;
        sync.save(&busy_ledger()).await.unwrap();

        sqlx::query("ALTER TABLE inventory RENAME TO inventory_old")
            .execute(sync.database().pool())
            .await
            .unwrap();

        let mut ledger = LedgerStore::new();
        let report = sync.load(&mut ledger).await;
        assert!(report.inventory.is_err());
        assert!(sync.inventory_held());

        ledger.add_stock("sugar", 10.0, "kg", 45.0).unwrap();
        ledger.record_sale("rice", 2.0, "kg", 50.0, None).unwrap();

        // no inventory write is attempted, so the save still goes through
        let saved = sync.save(&ledger).await.unwrap();
        assert_eq!(saved.inventory_upserted, 0);
        assert_eq!(saved.inventory_held, 2);
        assert_eq!(saved.sales_appended, 1);
        assert_eq!(sync.database().sales().count_for_day(DAY).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_roll_day_moves_the_window() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut sync = PersistenceSync::new(db.clone()).with_day("2026-10-18");

        let mut ledger = busy_ledger();
        sync.save(&ledger).await.unwrap();
        // recorded just before midnight, not yet saved
        ledger.record_sale("oil", 1.0, "litre", 130.0, None).unwrap();

        assert!(sync.roll_day(&mut ledger, DAY).await.unwrap());
        assert!(!sync.roll_day(&mut ledger, DAY).await.unwrap());
        assert_eq!(sync.day(), DAY);
        assert_eq!(sync.watermarks(), (0, 0));
        assert!(ledger.sales().is_empty());
        assert!(ledger.expenses().is_empty());
        assert_eq!(ledger.get_stock("oil").unwrap().quantity, 3.0);

        ledger.record_sale("rice", 1.0, "kg", 50.0, None).unwrap();
        let saved = sync.save(&ledger).await.unwrap();
        assert_eq!(saved.sales_appended, 1);

        assert_eq!(db.sales().count_for_day("2026-10-18").await.unwrap(), 2);
        assert_eq!(db.sales().count_for_day(DAY).await.unwrap(), 1);

        let mut restarted = PersistenceSync::new(db).with_day(DAY);
        let mut reloaded = LedgerStore::new();
        restarted.load(&mut reloaded).await;
        assert_eq!(reloaded.sales().len(), 1);
        assert_eq!(reloaded.sales()[0].item, "rice");
        assert!(reloaded.expenses().is_empty());
    }

    #[tokio::test]
    async fn test_failed_roll_keeps_the_old_day() {
        let mut sync = sync().await;
        let mut ledger = busy_ledger();

        sqlx::query("DROP TABLE sales")
            .execute(sync.database().pool())
            .await
            .unwrap();

        assert!(sync.roll_day(&mut ledger, "2026-10-20").await.is_err());
        assert_eq!(sync.day(), DAY);
        assert_eq!(ledger.sales().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_retryable() {
        let db = Database::new(DbConfig::in_memory().io_timeout(Duration::from_millis(20)))
            .await
            .unwrap();
        let sync = PersistenceSync::new(db);

        let err = sync
            .bounded("save", std::future::pending::<DbResult<()>>())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Timeout { .. }));
        assert!(err.is_retryable());
    }
}
