//! Database row models
//!
//! Rows are plain storage shapes; the engine converts them into its typed
//! domain values (`MetricKey` etc.).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `benchmarks` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BenchmarkRow {
    pub metric_key: String,
    pub value: f64,
    pub unit: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of the `assumption_overrides` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OverrideRow {
    pub metric_key: String,
    pub value: f64,
    pub unit: Option<String>,
    pub category: String,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Starts at 1, incremented on every upsert of the same key
    pub version: i64,
}
