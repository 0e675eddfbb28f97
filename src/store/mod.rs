//! Idempotent prediction persistence.
//!
//! One row per calendar date, keyed upsert semantics: writing the same
//! date twice overwrites in place instead of duplicating, so a re-run of a
//! cycle is observably a no-op when nothing changed. SQLite serializes the
//! writes, which keeps the at-most-one-record-per-date invariant even if a
//! caller manages to overlap cycles.

use crate::error::Result;
use crate::types::PredictionRecord;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS predictions (
    date TEXT PRIMARY KEY,
    predicted_high REAL NOT NULL,
    predicted_low REAL NOT NULL,
    updated_at TEXT NOT NULL
)";

/// Append-or-update log of daily predictions.
#[derive(Clone)]
pub struct PredictionStore {
    pool: SqlitePool,
}

impl PredictionStore {
    /// Open (creating if missing) the store at the given file path.
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::init(pool).await
    }

    /// Volatile store, used by tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        // A single long-lived connection: recycling it would drop the
        // in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert the record, or overwrite the existing one for that date.
    pub async fn upsert(&self, record: &PredictionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO predictions (date, predicted_high, predicted_low, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(date) DO UPDATE SET
                 predicted_high = excluded.predicted_high,
                 predicted_low = excluded.predicted_low,
                 updated_at = excluded.updated_at",
        )
        .bind(record.date)
        .bind(record.predicted_high)
        .bind(record.predicted_low)
        .execute(&self.pool)
        .await?;
        tracing::debug!(date = %record.date, "prediction upserted");
        Ok(())
    }

    pub async fn get(&self, date: NaiveDate) -> Result<Option<PredictionRecord>> {
        let row: Option<(NaiveDate, f64, f64)> = sqlx::query_as(
            "SELECT date, predicted_high, predicted_low FROM predictions WHERE date = ?1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Self::into_record))
    }

    /// Every record, ordered by date for chart overlay.
    pub async fn all(&self) -> Result<Vec<PredictionRecord>> {
        let rows: Vec<(NaiveDate, f64, f64)> = sqlx::query_as(
            "SELECT date, predicted_high, predicted_low FROM predictions ORDER BY date",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Self::into_record).collect())
    }

    /// The `limit` most recent records, oldest first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        let rows: Vec<(NaiveDate, f64, f64)> = sqlx::query_as(
            "SELECT date, predicted_high, predicted_low FROM predictions
             ORDER BY date DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        let mut records: Vec<PredictionRecord> =
            rows.into_iter().map(Self::into_record).collect();
        records.reverse();
        Ok(records)
    }

    fn into_record((date, predicted_high, predicted_low): (NaiveDate, f64, f64)) -> PredictionRecord {
        PredictionRecord {
            date,
            predicted_high,
            predicted_low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(day: u32, high: f64, low: f64) -> PredictionRecord {
        PredictionRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            predicted_high: high,
            predicted_low: low,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let store = PredictionStore::in_memory().await.unwrap();
        let rec = record(1, 70_000.0, 68_000.0);

        store.upsert(&rec).await.unwrap();
        store.upsert(&rec).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all, vec![rec]);
    }

    #[tokio::test]
    async fn upsert_overwrites_in_place() {
        let store = PredictionStore::in_memory().await.unwrap();

        store.upsert(&record(1, 70_000.0, 68_000.0)).await.unwrap();
        store.upsert(&record(1, 70_500.0, 68_200.0)).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all, vec![record(1, 70_500.0, 68_200.0)]);
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_date() {
        let store = PredictionStore::in_memory().await.unwrap();
        store.upsert(&record(1, 1.0, 0.5)).await.unwrap();

        let missing = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert_eq!(store.get(missing).await.unwrap(), None);
        assert_eq!(
            store.get(record(1, 1.0, 0.5).date).await.unwrap(),
            Some(record(1, 1.0, 0.5))
        );
    }

    #[tokio::test]
    async fn records_come_back_date_ordered() {
        let store = PredictionStore::in_memory().await.unwrap();
        store.upsert(&record(3, 3.0, 2.0)).await.unwrap();
        store.upsert(&record(1, 1.0, 0.5)).await.unwrap();
        store.upsert(&record(2, 2.0, 1.0)).await.unwrap();

        let dates: Vec<u32> = store
            .all()
            .await
            .unwrap()
            .iter()
            .map(|r| chrono::Datelike::day(&r.date))
            .collect();
        assert_eq!(dates, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn recent_keeps_chronological_order() {
        let store = PredictionStore::in_memory().await.unwrap();
        for day in 1..=5 {
            store.upsert(&record(day, day as f64, 0.0)).await.unwrap();
        }

        let recent = store.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(chrono::Datelike::day(&recent[0].date), 4);
        assert_eq!(chrono::Datelike::day(&recent[1].date), 5);
    }

    #[tokio::test]
    async fn store_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions.db");

        {
            let store = PredictionStore::connect(&path).await.unwrap();
            store.upsert(&record(1, 70_000.0, 68_000.0)).await.unwrap();
        }

        let store = PredictionStore::connect(&path).await.unwrap();
        assert_eq!(
            store.get(record(1, 0.0, 0.0).date).await.unwrap(),
            Some(record(1, 70_000.0, 68_000.0))
        );
    }
}
