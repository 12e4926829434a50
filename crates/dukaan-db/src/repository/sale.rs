//! # Sale Repository
//!
//! Append-only sale rows, each tagged with the day label it was saved under.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerStore::record_sale ──► SaleRecord (id = UUID v4)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PersistenceSync::save ──► append_with(tx, record, day)  (once)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next startup ──► list_for_day(today) ──► LedgerStore::restore_sale    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are never updated or deleted.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use dukaan_core::SaleRecord;

/// Repository for sale rows.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sales saved under `day`, oldest first.
    pub async fn list_for_day(&self, day: &str) -> DbResult<Vec<SaleRecord>> {
        let sales = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT
                id,
                item_key   AS item,
                quantity,
                unit,
                price      AS price_per_unit,
                total,
                created_at AS "timestamp"
            FROM sales
            WHERE day = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        debug!(day = %day, count = sales.len(), "Loaded sales");
        Ok(sales)
    }

    /// Appends one sale on the given connection or transaction.
    ///
    /// Returns whether a row was written. A record whose id is already stored
    /// is skipped, so replaying a batch never duplicates rows.
    pub async fn append_with(
        conn: &mut SqliteConnection,
        record: &SaleRecord,
        day: &str,
    ) -> DbResult<bool> {
        debug!(id = %record.id, item = %record.item, "Appending sale");

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO sales (
                id, item_key, quantity, unit, price, total, created_at, day
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.id)
        .bind(&record.item)
        .bind(record.quantity)
        .bind(&record.unit)
        .bind(record.price_per_unit)
        .bind(record.total)
        .bind(record.timestamp)
        .bind(day)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Appends one sale outside any transaction.
    pub async fn append(&self, record: &SaleRecord, day: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::append_with(&mut conn, record, day).await
    }

    /// Number of sales saved under `day`.
    pub async fn count_for_day(&self, day: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE day = ?1")
            .bind(day)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
