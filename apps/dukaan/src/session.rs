//! # Ledger Session
//!
//! Owns the in-memory ledger and its persistence for the life of the process.
//!
//! ## Per-Line Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line ──► IntentBatch::from_json ──► IntentHandler::handle_batch        │
//! │               │ (malformed)                  │                          │
//! │               ▼                              ▼                          │
//! │        single `unknown` intent         BatchOutcome ──► output line     │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                   PersistenceSync::save                 │
//! │                                   (failure logged, retried next line)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A session opened with [`Session::open`] follows the local clock: the first
//! line handled after midnight rolls the daily window before it is applied.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::ShopConfig;
use crate::error::AppResult;
use dukaan_core::{
    today_label, BatchOutcome, HandlerOptions, IntentBatch, IntentHandler, IntentKind,
    IntentRecord, LedgerStore, SummaryCalculator,
};
use dukaan_db::{Database, LoadReport, PersistenceSync, SaveReport};

/// One shop day of intake.
pub struct Session {
    ledger: LedgerStore,
    sync: PersistenceSync,
    config: ShopConfig,
    follow_clock: bool,
}

impl Session {
    /// Opens the configured database and restores today's ledger.
    pub async fn open(config: ShopConfig) -> AppResult<Self> {
        let db_config = config.db_config()?;
        info!(path = ?db_config.database_path, "Opening ledger database");

        let db = Database::new(db_config).await?;
        let mut session = Session::with_sync(PersistenceSync::new(db), config);
        session.follow_clock = true;
        session.restore().await;

        Ok(session)
    }

    /// Wraps an existing sync handle with an empty ledger. The day label
    /// stays whatever the sync was created with until [`Session::roll_to`].
    pub fn with_sync(sync: PersistenceSync, config: ShopConfig) -> Self {
        Session {
            ledger: LedgerStore::new(),
            sync,
            config,
            follow_clock: false,
        }
    }

    /// Loads persisted state into the ledger. Partial failures leave the
    /// affected collections empty.
    pub async fn restore(&mut self) -> LoadReport {
        let report = self.sync.load(&mut self.ledger).await;

        if report.is_total_failure() {
            warn!("Nothing restored; starting with an empty ledger");
        } else if !report.is_complete() {
            warn!(
                rejected_rows = report.inventory_rejected.len(),
                inventory_held = self.sync.inventory_held(),
                "Ledger partially restored"
            );
        }

        let calc = SummaryCalculator::new(&self.ledger);
        info!(
            day = %self.sync.day(),
            sales = %self.config.format_currency(calc.daily_sales_total()),
            expenses = %self.config.format_currency(calc.daily_expense_total()),
            "Ledger ready"
        );

        report
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// Moves the daily window to `day`. A failed flush of the old day is
    /// logged and the roll is retried on the next line.
    pub async fn roll_to(&mut self, day: &str) -> bool {
        match self.sync.roll_day(&mut self.ledger, day).await {
            Ok(rolled) => rolled,
            Err(err) => {
                warn!(error = %err, day = %day, "Day rollover postponed");
                false
            }
        }
    }

    /// Applies one input line and syncs the result.
    pub async fn handle_line(&mut self, line: &str) -> BatchOutcome {
        if self.follow_clock {
            self.roll_to(&today_label()).await;
        }

        let batch = IntentBatch::from_json(line).unwrap_or_else(|err| {
            warn!(error = %err, "Malformed intent line");
            IntentBatch::new(vec![IntentRecord::new(IntentKind::Unknown)])
        });

        let options = HandlerOptions::new(self.config.summary_options(), self.sync.day());
        let outcome = IntentHandler::new(&mut self.ledger, options).handle_batch(&batch);

        debug!(
            intents = batch.intents.len(),
            low_stock = outcome.alerts.items.len(),
            "Batch applied"
        );

        self.flush().await;
        outcome
    }

    /// Saves anything not yet persisted. Failures are logged and the
    /// unsaved tail stays queued for the next call.
    pub async fn flush(&mut self) -> Option<SaveReport> {
        self.sync.save(&self.ledger).await.ok()
    }

    /// Reads intent lines until EOF, writing one outcome line per input line.
    /// Blank lines are skipped.
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let outcome = self.handle_line(line).await;
            let mut encoded = serde_json::to_vec(&outcome)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }

        info!("Input closed, final sync");
        self.flush().await;
        Ok(())
    }

    /// Closes the database pool.
    pub async fn close(self) {
        self.sync.database().close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dukaan_core::ActionResult;
    use dukaan_db::DbConfig;

    const DAY: &str = "2026-10-19";

    async fn session() -> Session {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Session::with_sync(PersistenceSync::new(db).with_day(DAY), ShopConfig::default())
    }

    #[tokio::test]
    async fn test_line_is_applied_and_saved() {
        let mut session = session().await;

        let outcome = session
            .handle_line(
                r#"{"intents":[
                    {"intent":"inventory_in","item":"aloo","quantity":10,"unit":"kg","price_per_unit":20},
                    {"intent":"sale","item":"potatoes","quantity":7,"unit":"kg","price_per_unit":30}
                ]}"#,
            )
            .await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].action(), "stock_added");
        assert_eq!(outcome.results[1].action(), "sale_recorded");
        assert_eq!(outcome.alerts.items, vec!["potato (3 kg)".to_string()]);

        let db = session.sync.database();
        assert_eq!(db.sales().count_for_day(DAY).await.unwrap(), 1);
        let stored = db.inventory().get("potato").await.unwrap().unwrap();
        assert_eq!(stored.quantity, 3.0);
    }

    #[tokio::test]
    async fn test_bare_record_line() {
        let mut session = session().await;

        let outcome = session
            .handle_line(r#"{"intent":"expense","category":"bijli","total_amount":500}"#)
            .await;

        assert_eq!(outcome.results.len(), 1);
        match &outcome.results[0] {
            ActionResult::ExpenseRecorded { category, amount, .. } => {
                assert_eq!(category, "electricity");
                assert_eq!(*amount, 500.0);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_line_is_unknown() {
        let mut session = session().await;

        let outcome = session.handle_line("this is not json").await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].action(), "unknown");
        assert!(session.ledger().sales().is_empty());
    }

    #[tokio::test]
    async fn test_restart_restores_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut first = Session::with_sync(
            PersistenceSync::new(db.clone()).with_day(DAY),
            ShopConfig::default(),
        );
        first
            .handle_line(r#"{"intent":"inventory_in","item":"rice","quantity":20,"unit":"kg","price_per_unit":40}"#)
            .await;
        first
            .handle_line(r#"{"intent":"sale","item":"chawal","quantity":5,"unit":"kg","price_per_unit":55}"#)
            .await;

        let mut second =
            Session::with_sync(PersistenceSync::new(db).with_day(DAY), ShopConfig::default());
        let report = second.restore().await;
        assert!(report.is_complete());

        assert_eq!(second.ledger().sales().len(), 1);
        assert_eq!(second.ledger().get_stock("rice").unwrap().quantity, 15.0);

        // Restored rows are not appended again.
        let saved = second.flush().await.unwrap();
        assert_eq!(saved.sales_appended, 0);
        assert_eq!(
            second.sync.database().sales().count_for_day(DAY).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_lines_after_midnight_land_in_the_new_day() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut session = Session::with_sync(
            PersistenceSync::new(db.clone()).with_day("2026-10-18"),
            ShopConfig::default(),
        );

        session
            .handle_line(r#"{"intent":"inventory_in","item":"rice","quantity":20,"unit":"kg","price_per_unit":40}"#)
            .await;
        session
            .handle_line(r#"{"intent":"sale","item":"rice","quantity":5,"unit":"kg","price_per_unit":55}"#)
            .await;

        assert!(session.roll_to(DAY).await);
        session
            .handle_line(r#"{"intent":"sale","item":"rice","quantity":2,"unit":"kg","price_per_unit":55}"#)
            .await;
        let outcome = session.handle_line(r#"{"intent":"query_summary"}"#).await;

        let summary = serde_json::to_value(&outcome).unwrap();
        assert_eq!(summary["results"][0]["summary"]["date"], DAY);
        assert_eq!(summary["results"][0]["summary"]["total_sales"], 110.0);

        assert_eq!(db.sales().count_for_day("2026-10-18").await.unwrap(), 1);
        assert_eq!(db.sales().count_for_day(DAY).await.unwrap(), 1);

        let mut restarted =
            Session::with_sync(PersistenceSync::new(db).with_day(DAY), ShopConfig::default());
        restarted.restore().await;
        assert_eq!(restarted.ledger().sales().len(), 1);
        assert_eq!(restarted.ledger().get_stock("rice").unwrap().quantity, 13.0);
    }

    #[tokio::test]
    async fn test_run_writes_one_line_per_input() {
        let mut session = session().await;
        let input = concat!(
            r#"{"intent":"greeting"}"#,
            "\n\n",
            "{broken\n",
            r#"{"intent":"query_profit"}"#,
            "\n",
        );
        let mut output: Vec<u8> = Vec::new();

        session.run(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["results"][0]["action"], "greeting");
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["results"][0]["action"], "unknown");
        let third: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(third["results"][0]["action"], "profit");
    }
}
