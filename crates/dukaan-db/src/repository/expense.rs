//! # Expense Repository
//!
//! Append-only expense rows, tagged with the day label they were saved under.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use dukaan_core::ExpenseRecord;

/// Repository for expense rows.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Expenses saved under `day`, oldest first.
    pub async fn list_for_day(&self, day: &str) -> DbResult<Vec<ExpenseRecord>> {
        let expenses = sqlx::query_as::<_, ExpenseRecord>(
            r#"
            SELECT
                id,
                category,
                amount,
                description,
                created_at AS "timestamp"
            FROM expenses
            WHERE day = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        debug!(day = %day, count = expenses.len(), "Loaded expenses");
        Ok(expenses)
    }

    /// Appends one expense on the given connection or transaction.
    /// Returns false if a row with this id already exists.
    pub async fn append_with(
        conn: &mut SqliteConnection,
        record: &ExpenseRecord,
        day: &str,
    ) -> DbResult<bool> {
        debug!(id = %record.id, category = %record.category, "Appending expense");

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO expenses (
                id, category, amount, description, created_at, day
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.category)
        .bind(record.amount)
        .bind(&record.description)
        .bind(record.timestamp)
        .bind(day)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Appends one expense outside any transaction.
    pub async fn append(&self, record: &ExpenseRecord, day: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        Self::append_with(&mut conn, record, day).await
    }

    /// Number of expenses saved under `day`.
    pub async fn count_for_day(&self, day: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE day = ?1")
            .bind(day)
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
    use dukaan_core::generate_record_id;

    #[tokio::test]
    async fn test_append_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.expenses();

        let record = ExpenseRecord {
            id: generate_record_id(),
            category: "electricity".to_string(),
            amount: 500.0,
            description: "meter".to_string(),
            timestamp: Utc::now(),
        };
        assert!(repo.append(&record, "2026-10-19").await.unwrap());

        let stored = repo.list_for_day("2026-10-19").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, record.id);
        assert_eq!(stored[0].category, "electricity");
        assert_eq!(stored[0].description, "meter");

        assert!(repo.list_for_day("2026-10-20").await.unwrap().is_empty());
    }
}
