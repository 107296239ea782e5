//! Resolver: query and mutation surface over the three tiers
//!
//! Reads fan out to both stores concurrently and merge only once both have
//! answered. A failed or cancelled load never replaces the cached map, so
//! callers see either a complete merge or an error.
//!
//! All writes go to the override store. A successful write invalidates the
//! cached map; a failed write leaves it untouched.

mod merge;

pub use merge::{merge, EffectiveMap};

use crate::error::Result;
use crate::registry::SchemaRegistry;
use crate::store::{BenchmarkStore, OverrideStore};
use crate::types::{
    EffectiveAssumption, MetricKey, OverrideValue, OverrideWrite, SaveAssumption,
    GENERAL_CATEGORY,
};
use lore_common::config::LoreConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Keep the merged map between reads (invalidated on every write)
    pub cache_effective_map: bool,
    /// Recorded as `created_by` on overrides written through this resolver
    pub actor: Option<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            cache_effective_map: true,
            actor: None,
        }
    }
}

impl From<&LoreConfig> for ResolverOptions {
    fn from(config: &LoreConfig) -> Self {
        Self {
            cache_effective_map: config.cache_effective_map,
            actor: config.created_by.clone(),
        }
    }
}

pub struct Resolver {
    registry: Arc<SchemaRegistry>,
    benchmarks: Arc<dyn BenchmarkStore>,
    overrides: Arc<dyn OverrideStore>,
    options: ResolverOptions,
    cache: RwLock<Option<Arc<EffectiveMap>>>,
    /// Bumped on every invalidation; a load only publishes its map if the
    /// generation it started under is still current
    generation: AtomicU64,
}

impl Resolver {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        benchmarks: Arc<dyn BenchmarkStore>,
        overrides: Arc<dyn OverrideStore>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            registry,
            benchmarks,
            overrides,
            options,
            cache: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Current merged map, loading it if there is no valid cached copy
    pub async fn snapshot(&self) -> Result<Arc<EffectiveMap>> {
        if self.options.cache_effective_map {
            if let Some(map) = self.cache.read().await.as_ref() {
                return Ok(Arc::clone(map));
            }
        }
        self.load().await
    }

    /// Cached map if one is loaded; `None` means "not ready"
    pub async fn cached(&self) -> Option<Arc<EffectiveMap>> {
        self.cache.read().await.clone()
    }

    /// Drop the cached map and reload from both stores
    ///
    /// Use after benchmarks change outside this process.
    pub async fn refresh(&self) -> Result<Arc<EffectiveMap>> {
        self.invalidate().await;
        self.load().await
    }

    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.write().await.take();
    }

    async fn load(&self) -> Result<Arc<EffectiveMap>> {
        let generation = self.generation.load(Ordering::SeqCst);

        let (benchmarks, overrides) =
            tokio::try_join!(self.benchmarks.list_all(), self.overrides.list_all())?;

        let map = Arc::new(merge(Arc::clone(&self.registry), &benchmarks, &overrides));

        if self.options.cache_effective_map {
            let mut cache = self.cache.write().await;
            if self.generation.load(Ordering::SeqCst) == generation {
                *cache = Some(Arc::clone(&map));
            } else {
                debug!("Discarding merge started before a write");
            }
        }

        Ok(map)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Effective value: merged benchmark/override value, else non-zero
    /// registry default, else `fallback`, else 0.0
    pub async fn get_effective_value(&self, key: &str, fallback: Option<f64>) -> Result<f64> {
        Ok(self.snapshot().await?.effective_value(key, fallback))
    }

    pub async fn get_assumption(&self, key: &str) -> Result<Option<EffectiveAssumption>> {
        Ok(self.snapshot().await?.get_assumption(key).cloned())
    }

    /// Registered metrics of `category`, in registry order
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<EffectiveAssumption>> {
        let map = self.snapshot().await?;
        Ok(map.list_by_category(category).into_iter().cloned().collect())
    }

    /// Raw override rows, for audit views
    pub async fn list_overrides(&self) -> Result<Vec<OverrideValue>> {
        self.overrides.list_all().await
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Reject NaN and infinities; SQLite cannot store them as REAL and they
    /// have no JSON form
    fn check_finite(input: &SaveAssumption) -> Result<()> {
        if input.value.is_finite() {
            return Ok(());
        }
        warn!(key = %input.metric_key, value = input.value, "Rejected non-finite override");
        Err(lore_common::Error::InvalidInput(format!(
            "value for {} must be a finite number, got {}",
            input.metric_key, input.value
        ))
        .into())
    }

    /// Fill in unit and category from the registry and attach provenance
    fn infer(&self, input: SaveAssumption, expected_version: Option<i64>) -> OverrideWrite {
        let key = input.metric_key.as_str();
        let category = input.category.unwrap_or_else(|| {
            self.registry
                .get_category(key)
                .unwrap_or(GENERAL_CATEGORY)
                .to_string()
        });
        let unit = input
            .unit
            .or_else(|| self.registry.get_unit(key).map(str::to_string));

        OverrideWrite {
            metric_key: input.metric_key,
            value: input.value,
            unit,
            category,
            notes: input.notes,
            created_by: self.options.actor.clone(),
            expected_version,
        }
    }

    /// Save one override (last-write-wins)
    pub async fn save_assumption(&self, input: SaveAssumption) -> Result<()> {
        Self::check_finite(&input)?;
        let write = self.infer(input, None);
        self.write_one(write).await
    }

    /// Save one override only if the stored row is still at `expected_version`
    /// (0 when the key has no override yet)
    pub async fn save_assumption_checked(
        &self,
        input: SaveAssumption,
        expected_version: i64,
    ) -> Result<()> {
        Self::check_finite(&input)?;
        let write = self.infer(input, Some(expected_version));
        self.write_one(write).await
    }

    async fn write_one(&self, write: OverrideWrite) -> Result<()> {
        let key = write.metric_key.clone();
        let value = write.value;

        if let Err(e) = self.overrides.upsert_one(write).await {
            warn!(key = %key, error = %e, "Override save failed");
            return Err(e);
        }

        self.invalidate().await;
        info!(key = %key, value, "Saved assumption override");
        Ok(())
    }

    /// Save several overrides as one all-or-nothing batch
    ///
    /// Validation and inference run for every item before the single store
    /// call.
    pub async fn save_multiple_assumptions(&self, inputs: Vec<SaveAssumption>) -> Result<()> {
        if inputs.is_empty() {
            return Ok(());
        }
        // Whole batch is validated before anything reaches the store
        inputs.iter().try_for_each(Self::check_finite)?;

        let writes: Vec<OverrideWrite> = inputs
            .into_iter()
            .map(|input| self.infer(input, None))
            .collect();
        let count = writes.len();

        if let Err(e) = self.overrides.upsert_many(writes).await {
            warn!(count, error = %e, "Override batch save failed");
            return Err(e);
        }

        self.invalidate().await;
        info!(count, "Saved assumption override batch");
        Ok(())
    }

    /// Remove an override; the key reverts to benchmark or registry default
    pub async fn delete_assumption(&self, key: &str) -> Result<()> {
        let key = MetricKey::from(key);

        if let Err(e) = self.overrides.delete_one(&key).await {
            warn!(key = %key, error = %e, "Override delete failed");
            return Err(e);
        }

        self.invalidate().await;
        info!(key = %key, "Deleted assumption override");
        Ok(())
    }
}
