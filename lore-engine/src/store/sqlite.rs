//! SQLite store adapters
//!
//! Tables are created by `lore_common::db::create_tables`.

use super::{BenchmarkStore, OverrideStore};
use crate::error::{Error, Result};
use crate::types::{BenchmarkValue, MetricKey, OverrideValue, OverrideWrite};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lore_common::db::{BenchmarkRow, OverrideRow};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

const UPSERT_OVERRIDE_SQL: &str = r#"
    INSERT INTO assumption_overrides
        (metric_key, value, unit, category, notes, created_by, updated_at, version)
    VALUES (?, ?, ?, ?, ?, ?, ?, 1)
    ON CONFLICT(metric_key) DO UPDATE SET
        value = excluded.value,
        unit = excluded.unit,
        category = excluded.category,
        notes = excluded.notes,
        created_by = COALESCE(assumption_overrides.created_by, excluded.created_by),
        updated_at = excluded.updated_at,
        version = assumption_overrides.version + 1
"#;

/// Benchmark tier backed by the `benchmarks` table
#[derive(Clone)]
pub struct SqliteBenchmarkStore {
    pool: SqlitePool,
}

impl SqliteBenchmarkStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert a batch of benchmark values in one transaction
    ///
    /// Entry point for the external research import. The resolver never
    /// calls this.
    pub async fn import(&self, values: &[BenchmarkValue]) -> lore_common::Result<usize> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for value in values {
            sqlx::query(
                "INSERT INTO benchmarks (metric_key, value, unit, updated_at) VALUES (?, ?, ?, ?)
                 ON CONFLICT(metric_key) DO UPDATE SET
                     value = excluded.value, unit = excluded.unit, updated_at = excluded.updated_at",
            )
            .bind(value.metric_key.as_str())
            .bind(value.value)
            .bind(value.unit.as_deref())
            .bind(value.updated_at.unwrap_or(now))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(count = values.len(), "Imported benchmark values");
        Ok(values.len())
    }
}

#[async_trait]
impl BenchmarkStore for SqliteBenchmarkStore {
    async fn list_all(&self) -> Result<Vec<BenchmarkValue>> {
        let rows = sqlx::query_as::<_, BenchmarkRow>(
            "SELECT metric_key, value, unit, updated_at FROM benchmarks ORDER BY metric_key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::BenchmarkFetchFailed(e.into()))?;

        Ok(rows.into_iter().map(BenchmarkValue::from).collect())
    }
}

/// Override tier backed by the `assumption_overrides` table
#[derive(Clone)]
pub struct SqliteOverrideStore {
    pool: SqlitePool,
}

impl SqliteOverrideStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Apply one write inside an open transaction
///
/// Any failure is reported against every key in `batch_keys`, since the
/// caller rolls back the whole batch.
async fn apply_write(
    conn: &mut SqliteConnection,
    write: &OverrideWrite,
    now: DateTime<Utc>,
    batch_keys: &[MetricKey],
) -> Result<()> {
    let fail = |e: sqlx::Error| Error::write_failed(batch_keys.iter().cloned(), e);

    if let Some(expected) = write.expected_version {
        let actual: Option<i64> =
            sqlx::query_scalar("SELECT version FROM assumption_overrides WHERE metric_key = ?")
                .bind(write.metric_key.as_str())
                .fetch_optional(&mut *conn)
                .await
                .map_err(fail)?;
        let actual = actual.unwrap_or(0);
        if actual != expected {
            return Err(Error::StaleOverride {
                key: write.metric_key.clone(),
                expected,
                actual,
            });
        }
    }

    sqlx::query(UPSERT_OVERRIDE_SQL)
        .bind(write.metric_key.as_str())
        .bind(write.value)
        .bind(write.unit.as_deref())
        .bind(write.category.as_str())
        .bind(write.notes.as_deref())
        .bind(write.created_by.as_deref())
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(fail)?;

    Ok(())
}

#[async_trait]
impl OverrideStore for SqliteOverrideStore {
    async fn list_all(&self) -> Result<Vec<OverrideValue>> {
        let rows = sqlx::query_as::<_, OverrideRow>(
            "SELECT metric_key, value, unit, category, notes, created_by, updated_at, version
             FROM assumption_overrides ORDER BY metric_key",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::OverrideFetchFailed(e.into()))?;

        Ok(rows.into_iter().map(OverrideValue::from).collect())
    }

    async fn upsert_one(&self, write: OverrideWrite) -> Result<()> {
        self.upsert_many(vec![write]).await
    }

    async fn upsert_many(&self, writes: Vec<OverrideWrite>) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }

        let keys: Vec<MetricKey> = writes.iter().map(|w| w.metric_key.clone()).collect();
        let now = Utc::now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::write_failed(keys.iter().cloned(), e))?;

        for write in &writes {
            // Early return drops `tx`, rolling back earlier writes in the batch
            apply_write(&mut *tx, write, now, &keys).await?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::write_failed(keys.iter().cloned(), e))?;

        debug!(count = writes.len(), "Committed override batch");
        Ok(())
    }

    async fn delete_one(&self, key: &MetricKey) -> Result<()> {
        let result = sqlx::query("DELETE FROM assumption_overrides WHERE metric_key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::write_failed([key.clone()], e))?;

        debug!(key = %key, removed = result.rows_affected(), "Deleted override");
        Ok(())
    }
}
