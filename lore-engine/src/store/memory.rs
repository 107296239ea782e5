//! In-memory store adapters
//!
//! Used by tests and by embedders that supply their own persistence. Both
//! stores can be switched into a failing state to exercise error paths.

use super::{BenchmarkStore, OverrideStore};
use crate::error::{Error, Result, StoreFailure};
use crate::types::{BenchmarkValue, MetricKey, OverrideValue, OverrideWrite};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

fn unavailable() -> StoreFailure {
    StoreFailure::Unavailable("in-memory store switched to failing".to_string())
}

#[derive(Default)]
pub struct MemoryBenchmarkStore {
    values: RwLock<BTreeMap<MetricKey, BenchmarkValue>>,
    failing: AtomicBool,
}

impl MemoryBenchmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: impl IntoIterator<Item = BenchmarkValue>) -> Self {
        let values = values
            .into_iter()
            .map(|v| (v.metric_key.clone(), v))
            .collect();
        Self {
            values: RwLock::new(values),
            failing: AtomicBool::new(false),
        }
    }

    /// Simulate the external research process publishing a value
    pub async fn publish(&self, value: BenchmarkValue) {
        self.values
            .write()
            .await
            .insert(value.metric_key.clone(), value);
    }

    /// Simulate the external research process withdrawing a value
    pub async fn withdraw(&self, key: &str) {
        self.values.write().await.remove(key);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl BenchmarkStore for MemoryBenchmarkStore {
    async fn list_all(&self) -> Result<Vec<BenchmarkValue>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::BenchmarkFetchFailed(unavailable()));
        }
        Ok(self.values.read().await.values().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryOverrideStore {
    rows: RwLock<BTreeMap<MetricKey, OverrideValue>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn get(&self, key: &str) -> Option<OverrideValue> {
        self.rows.read().await.get(key).cloned()
    }
}

#[async_trait]
impl OverrideStore for MemoryOverrideStore {
    async fn list_all(&self) -> Result<Vec<OverrideValue>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::OverrideFetchFailed(unavailable()));
        }
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn upsert_one(&self, write: OverrideWrite) -> Result<()> {
        self.upsert_many(vec![write]).await
    }

    async fn upsert_many(&self, writes: Vec<OverrideWrite>) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::write_failed(
                writes.into_iter().map(|w| w.metric_key),
                unavailable(),
            ));
        }

        let mut rows = self.rows.write().await;

        // Validate the whole batch before touching any row
        let mut staged = rows.clone();
        let now = Utc::now();
        for write in writes {
            let current = staged.get(&write.metric_key);
            if let Some(expected) = write.expected_version {
                let actual = current.map(|row| row.version).unwrap_or(0);
                if actual != expected {
                    return Err(Error::StaleOverride {
                        key: write.metric_key,
                        expected,
                        actual,
                    });
                }
            }

            let (version, created_by) = match current {
                Some(row) => (row.version + 1, row.created_by.clone().or(write.created_by)),
                None => (1, write.created_by),
            };
            staged.insert(
                write.metric_key.clone(),
                OverrideValue {
                    metric_key: write.metric_key,
                    value: write.value,
                    unit: write.unit,
                    category: write.category,
                    notes: write.notes,
                    created_by,
                    updated_at: now,
                    version,
                },
            );
        }

        *rows = staged;
        Ok(())
    }

    async fn delete_one(&self, key: &MetricKey) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::write_failed([key.clone()], unavailable()));
        }
        self.rows.write().await.remove(key);
        Ok(())
    }
}
