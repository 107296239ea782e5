//! Persistence seams for the two stored tiers
//!
//! Both stores key rows by [`MetricKey`]. The override store must enforce key
//! uniqueness so that every write is an upsert. Adapters report failures with
//! the engine's error taxonomy:
//! - reads: `BenchmarkFetchFailed` / `OverrideFetchFailed`, never an empty list
//! - writes: `OverrideWriteFailed` carrying every key of the attempted write

mod memory;
mod sqlite;

pub use memory::{MemoryBenchmarkStore, MemoryOverrideStore};
pub use sqlite::{SqliteBenchmarkStore, SqliteOverrideStore};

use crate::error::Result;
use crate::types::{BenchmarkValue, MetricKey, OverrideValue, OverrideWrite};
use async_trait::async_trait;

/// Read-only source of organizational benchmark values
#[async_trait]
pub trait BenchmarkStore: Send + Sync {
    /// Every current benchmark, unfiltered
    async fn list_all(&self) -> Result<Vec<BenchmarkValue>>;
}

/// Read/write source of user overrides
#[async_trait]
pub trait OverrideStore: Send + Sync {
    /// Every stored override
    async fn list_all(&self) -> Result<Vec<OverrideValue>>;

    /// Insert or replace the override for `write.metric_key`
    async fn upsert_one(&self, write: OverrideWrite) -> Result<()>;

    /// Upsert a batch atomically: either every write lands or none does.
    /// A key repeated within the batch takes its last value.
    async fn upsert_many(&self, writes: Vec<OverrideWrite>) -> Result<()>;

    /// Remove the override for `key`; removing a missing key is a no-op
    async fn delete_one(&self, key: &MetricKey) -> Result<()>;
}
