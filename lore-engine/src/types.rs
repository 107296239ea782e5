//! Data model shared by the registry, stores and resolver

use chrono::{DateTime, Utc};
use lore_common::db::{BenchmarkRow, OverrideRow};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Category given to metrics the registry does not know about
pub const GENERAL_CATEGORY: &str = "general";

/// Unit given to untracked metrics when no tier supplies one
pub const FALLBACK_UNIT: &str = "number";

/// Identifier of a single named assumption
///
/// Soft reference: benchmark and override rows may name keys the registry
/// has never heard of, and that is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricKey(String);

impl MetricKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MetricKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for MetricKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Tier an effective value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionSource {
    SchemaDefault,
    Benchmark,
    Override,
}

impl fmt::Display for AssumptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssumptionSource::SchemaDefault => "schema_default",
            AssumptionSource::Benchmark => "benchmark",
            AssumptionSource::Override => "override",
        };
        f.write_str(s)
    }
}

/// Schema registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: MetricKey,
    pub category: String,
    /// Display unit: percent, currency, count, ratio, ...
    pub unit: String,
    pub label: String,
    pub default_value: f64,
}

/// Reference value maintained outside the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkValue {
    pub metric_key: MetricKey,
    pub value: f64,
    /// Inherits the registry unit when absent
    pub unit: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BenchmarkValue {
    pub fn new(metric_key: impl Into<MetricKey>, value: f64) -> Self {
        Self {
            metric_key: metric_key.into(),
            value,
            unit: None,
            updated_at: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

impl From<BenchmarkRow> for BenchmarkValue {
    fn from(row: BenchmarkRow) -> Self {
        Self {
            metric_key: MetricKey::from(row.metric_key),
            value: row.value,
            unit: row.unit,
            updated_at: row.updated_at,
        }
    }
}

/// Stored user override; at most one per metric key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideValue {
    pub metric_key: MetricKey,
    pub value: f64,
    pub unit: Option<String>,
    /// Resolved at write time: explicit, else registry category, else "general"
    pub category: String,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl From<OverrideRow> for OverrideValue {
    fn from(row: OverrideRow) -> Self {
        Self {
            metric_key: MetricKey::from(row.metric_key),
            value: row.value,
            unit: row.unit,
            category: row.category,
            notes: row.notes,
            created_by: row.created_by,
            updated_at: row.updated_at,
            version: row.version,
        }
    }
}

/// Caller input to a save; unit and category are inferred when absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveAssumption {
    pub metric_key: MetricKey,
    pub value: f64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl SaveAssumption {
    pub fn new(metric_key: impl Into<MetricKey>, value: f64) -> Self {
        Self {
            metric_key: metric_key.into(),
            value,
            unit: None,
            category: None,
            notes: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Fully inferred write handed to an `OverrideStore`
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideWrite {
    pub metric_key: MetricKey,
    pub value: f64,
    pub unit: Option<String>,
    pub category: String,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    /// `None` is last-write-wins; `Some(v)` requires the stored version to be `v`
    /// (0 when no row exists)
    pub expected_version: Option<i64>,
}

/// Merged value for one metric key. Derived on every merge, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveAssumption {
    pub metric_key: MetricKey,
    pub value: f64,
    pub unit: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub source: AssumptionSource,
    /// Benchmark in force beneath an override, kept for revert display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
