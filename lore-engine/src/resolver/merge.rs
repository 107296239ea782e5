//! Tier merge
//!
//! Pure function of three snapshots. Applied in fixed order:
//! 1. Every registry definition enters as `schema_default`
//! 2. Every benchmark overwrites or inserts, source `benchmark`
//! 3. Every override overwrites or inserts, source `override`, keeping the
//!    benchmark beneath it as `benchmark_value`
//!
//! Order within a tier does not matter: each entry touches only its own key.

use crate::registry::SchemaRegistry;
use crate::types::{
    AssumptionSource, BenchmarkValue, EffectiveAssumption, MetricKey, OverrideValue,
    FALLBACK_UNIT, GENERAL_CATEGORY,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Merged assumptions, one entry per metric key
#[derive(Debug, Clone)]
pub struct EffectiveMap {
    registry: Arc<SchemaRegistry>,
    entries: BTreeMap<MetricKey, EffectiveAssumption>,
}

/// Merge registry defaults, benchmarks and overrides
pub fn merge(
    registry: Arc<SchemaRegistry>,
    benchmarks: &[BenchmarkValue],
    overrides: &[OverrideValue],
) -> EffectiveMap {
    let mut entries: BTreeMap<MetricKey, EffectiveAssumption> = registry
        .definitions()
        .iter()
        .map(|def| {
            (
                def.key.clone(),
                EffectiveAssumption {
                    metric_key: def.key.clone(),
                    value: def.default_value,
                    unit: def.unit.clone(),
                    category: def.category.clone(),
                    label: Some(def.label.clone()),
                    source: AssumptionSource::SchemaDefault,
                    benchmark_value: None,
                    override_value: None,
                    notes: None,
                    updated_at: None,
                },
            )
        })
        .collect();

    let mut untracked = 0usize;

    for benchmark in benchmarks {
        match entries.get_mut(&benchmark.metric_key) {
            Some(entry) => {
                entry.value = benchmark.value;
                if let Some(unit) = &benchmark.unit {
                    entry.unit = unit.clone();
                }
                entry.source = AssumptionSource::Benchmark;
                entry.benchmark_value = Some(benchmark.value);
                entry.updated_at = benchmark.updated_at;
            }
            None => {
                untracked += 1;
                entries.insert(
                    benchmark.metric_key.clone(),
                    EffectiveAssumption {
                        metric_key: benchmark.metric_key.clone(),
                        value: benchmark.value,
                        unit: benchmark
                            .unit
                            .clone()
                            .unwrap_or_else(|| FALLBACK_UNIT.to_string()),
                        category: GENERAL_CATEGORY.to_string(),
                        label: None,
                        source: AssumptionSource::Benchmark,
                        benchmark_value: Some(benchmark.value),
                        override_value: None,
                        notes: None,
                        updated_at: benchmark.updated_at,
                    },
                );
            }
        }
    }

    for item in overrides {
        let registered = registry.get_definition(item.metric_key.as_str()).is_some();
        match entries.get_mut(&item.metric_key) {
            Some(entry) => {
                entry.value = item.value;
                if let Some(unit) = &item.unit {
                    entry.unit = unit.clone();
                }
                // Registered keys keep their registry grouping
                if !registered {
                    entry.category = item.category.clone();
                }
                entry.source = AssumptionSource::Override;
                entry.override_value = Some(item.value);
                entry.notes = item.notes.clone();
                entry.updated_at = Some(item.updated_at);
            }
            None => {
                untracked += 1;
                entries.insert(
                    item.metric_key.clone(),
                    EffectiveAssumption {
                        metric_key: item.metric_key.clone(),
                        value: item.value,
                        unit: item
                            .unit
                            .clone()
                            .unwrap_or_else(|| FALLBACK_UNIT.to_string()),
                        category: item.category.clone(),
                        label: None,
                        source: AssumptionSource::Override,
                        benchmark_value: None,
                        override_value: Some(item.value),
                        notes: item.notes.clone(),
                        updated_at: Some(item.updated_at),
                    },
                );
            }
        }
    }

    debug!(
        registered = registry.len(),
        benchmarks = benchmarks.len(),
        overrides = overrides.len(),
        untracked,
        "Merged assumption tiers"
    );

    EffectiveMap { registry, entries }
}

impl EffectiveMap {
    /// Effective value with the three-level fallback:
    /// benchmark/override value, else non-zero registry default, else
    /// `fallback`, else 0.0.
    ///
    /// A registry default of exactly 0.0 counts as "no default", so a
    /// supplied `fallback` wins over it.
    pub fn effective_value(&self, key: &str, fallback: Option<f64>) -> f64 {
        if let Some(entry) = self.entries.get(key) {
            if entry.source != AssumptionSource::SchemaDefault {
                return entry.value;
            }
        }

        let default = self.registry.get_default_value(key);
        if default != 0.0 {
            return default;
        }

        fallback.unwrap_or(0.0)
    }

    pub fn get_assumption(&self, key: &str) -> Option<&EffectiveAssumption> {
        self.entries.get(key)
    }

    /// Entries whose registry category is `category`, in registry order
    ///
    /// Keys outside the registry are not reachable here even when an override
    /// names this category.
    pub fn list_by_category(&self, category: &str) -> Vec<&EffectiveAssumption> {
        self.registry
            .list_by_category(category)
            .into_iter()
            .filter_map(|def| self.entries.get(&def.key))
            .collect()
    }

    /// All entries ordered by key
    pub fn iter(&self) -> impl Iterator<Item = &EffectiveAssumption> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}
