//! # Inventory Repository
//!
//! One row per canonical item key. Every sync rewrites every row
//! (insert-or-replace), so the table always mirrors the in-memory ledger.
//!
//! Rows are decoded one at a time on load: a row that no longer decodes is
//! set aside in [`InventoryRows::rejected`] and the rest still come back.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use dukaan_core::InventoryEntry;

const SELECT_ENTRY: &str = r#"
    SELECT
        item_key   AS "key",
        quantity,
        unit,
        avg_cost   AS avg_cost_per_unit,
        updated_at AS last_modified
    FROM inventory
"#;

/// A stored inventory row that could not be decoded.
#[derive(Debug)]
pub struct RejectedRow {
    /// The row's item key, if that column itself was readable.
    pub key: Option<String>,
    pub error: DbError,
}

/// Result of reading the whole inventory table.
#[derive(Debug, Default)]
pub struct InventoryRows {
    pub entries: Vec<InventoryEntry>,
    pub rejected: Vec<RejectedRow>,
}

/// Repository for inventory rows.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// All stored entries, ordered by key. Undecodable rows are rejected
    /// individually; only a failure to read the table is an error.
    pub async fn list(&self) -> DbResult<InventoryRows> {
        let query = format!("{SELECT_ENTRY} ORDER BY item_key");
        let rows: Vec<SqliteRow> = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut result = InventoryRows::default();
        for row in &rows {
            match InventoryEntry::from_row(row) {
                Ok(entry) => result.entries.push(entry),
                Err(err) => {
                    let key = row.try_get::<String, _>("key").ok();
                    warn!(item = ?key, error = %err, "Skipping undecodable inventory row");
                    result.rejected.push(RejectedRow {
                        key,
                        error: err.into(),
                    });
                }
            }
        }

        debug!(
            count = result.entries.len(),
            rejected = result.rejected.len(),
            "Loaded inventory rows"
        );
        Ok(result)
    }

    /// One entry by canonical key.
    pub async fn get(&self, key: &str) -> DbResult<Option<InventoryEntry>> {
        let query = format!("{SELECT_ENTRY} WHERE item_key = ?1");
        let entry = sqlx::query_as::<_, InventoryEntry>(&query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Inserts or replaces one entry outside any transaction.
    pub async fn upsert(&self, entry: &InventoryEntry) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_with(&mut conn, entry).await
    }

    /// Inserts or replaces one entry on the given connection or transaction.
    pub async fn upsert_with(conn: &mut SqliteConnection, entry: &InventoryEntry) -> DbResult<()> {
        debug!(item = %entry.key, quantity = entry.quantity, "Upserting inventory row");

        sqlx::query(
            r#"
            INSERT INTO inventory (item_key, quantity, unit, avg_cost, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(item_key) DO UPDATE SET
                quantity   = excluded.quantity,
                unit       = excluded.unit,
                avg_cost   = excluded.avg_cost,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.key)
        .bind(entry.quantity)
        .bind(&entry.unit)
        .bind(entry.avg_cost_per_unit)
        .bind(entry.last_modified)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Number of stored entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::pool::{Database, DbConfig};

    fn entry(key: &str, quantity: f64, cost: f64) -> InventoryEntry {
        InventoryEntry {
            key: key.to_string(),
            quantity,
            unit: "kg".to_string(),
            avg_cost_per_unit: cost,
            last_modified: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();

        repo.upsert(&entry("rice", 10.0, 40.0)).await.unwrap();
        repo.upsert(&entry("rice", -2.5, 42.0)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let stored = repo.get("rice").await.unwrap().unwrap();
        assert_eq!(stored.quantity, -2.5);
        assert_eq!(stored.avg_cost_per_unit, 42.0);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_key() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();

        repo.upsert(&entry("sugar", 1.0, 40.0)).await.unwrap();
        repo.upsert(&entry("oil", 1.0, 120.0)).await.unwrap();

        let rows = repo.list().await.unwrap();
        let keys: Vec<String> = rows.entries.into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["oil".to_string(), "sugar".to_string()]);
        assert!(rows.rejected.is_empty());
        assert!(repo.get("salt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_rejects_bad_rows_individually() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();

        repo.upsert(&entry("rice", 20.0, 40.0)).await.unwrap();
        sqlx::query(
            "INSERT INTO inventory (item_key, quantity, unit, avg_cost, updated_at) \
             VALUES ('oil', 4, 'litre', 120, 'garbage')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let rows = repo.list().await.unwrap();
        assert_eq!(rows.entries.len(), 1);
        assert_eq!(rows.entries[0].key, "rice");
        assert_eq!(rows.rejected.len(), 1);
        assert_eq!(rows.rejected[0].key.as_deref(), Some("oil"));
        assert!(matches!(rows.rejected[0].error, DbError::Decode { .. }));
    }
}
