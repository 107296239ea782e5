//! Schema registry
//!
//! Static, versioned catalog of metric definitions grouped by category.
//! Immutable once built. Declaration order is preserved and drives
//! [`SchemaRegistry::list_by_category`], so UI grouping stays stable.
//!
//! Looking up a key that is not registered is an expected outcome: many keys
//! only ever appear as benchmarks or overrides.

mod catalog;
mod loader;

pub use catalog::{CatalogEntry, BUILTIN_CATALOG, BUILTIN_CATALOG_VERSION};

use crate::error::{Error, Result};
use crate::types::{MetricDefinition, MetricKey};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Process-wide registry built from the compiled-in catalog
static BUILTIN: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| {
    let definitions = BUILTIN_CATALOG.iter().map(CatalogEntry::to_definition).collect();
    // Catalog keys are unique; covered by test_builtin_catalog_loads
    Arc::new(
        SchemaRegistry::new(BUILTIN_CATALOG_VERSION, definitions)
            .expect("built-in catalog must not contain duplicate keys"),
    )
});

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaRegistry {
    version: u32,
    /// Category names in first-declaration order
    categories: Vec<String>,
    definitions: Vec<MetricDefinition>,
    index: HashMap<MetricKey, usize>,
}

impl SchemaRegistry {
    /// Build a registry from definitions in declaration order
    ///
    /// Duplicate keys are rejected.
    pub fn new(version: u32, definitions: Vec<MetricDefinition>) -> Result<Self> {
        let mut categories: Vec<String> = Vec::new();
        let mut index = HashMap::with_capacity(definitions.len());

        for (position, def) in definitions.iter().enumerate() {
            if index.insert(def.key.clone(), position).is_some() {
                return Err(Error::Registry(format!(
                    "duplicate metric key: {}",
                    def.key
                )));
            }
            if !categories.iter().any(|c| c == &def.category) {
                categories.push(def.category.clone());
            }
        }

        Ok(Self {
            version,
            categories,
            definitions,
            index,
        })
    }

    /// Registry with no definitions
    pub fn empty() -> Self {
        Self {
            version: 0,
            categories: Vec::new(),
            definitions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Shared registry of the compiled-in assumptions catalog
    pub fn builtin() -> Arc<SchemaRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a registry from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        loader::parse(content)
    }

    /// Read a registry TOML file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(lore_common::Error::from)?;
        Self::from_toml_str(&content)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn get_definition(&self, key: &str) -> Option<&MetricDefinition> {
        self.index.get(key).map(|&i| &self.definitions[i])
    }

    /// Registered default, or 0.0 for unknown keys
    ///
    /// Callers must read 0.0 as "no schema default", which makes a registered
    /// default of exactly zero indistinguishable from an unregistered key.
    pub fn get_default_value(&self, key: &str) -> f64 {
        self.get_definition(key)
            .map(|def| def.default_value)
            .unwrap_or(0.0)
    }

    pub fn get_category(&self, key: &str) -> Option<&str> {
        self.get_definition(key).map(|def| def.category.as_str())
    }

    pub fn get_unit(&self, key: &str) -> Option<&str> {
        self.get_definition(key).map(|def| def.unit.as_str())
    }

    /// Definitions in a category, in declaration order (empty if unknown)
    pub fn list_by_category(&self, category: &str) -> Vec<&MetricDefinition> {
        self.definitions
            .iter()
            .filter(|def| def.category == category)
            .collect()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// All definitions in declaration order
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(key: &str, category: &str, default_value: f64) -> MetricDefinition {
        MetricDefinition {
            key: MetricKey::from(key),
            category: category.to_string(),
            unit: "percent".to_string(),
            label: key.to_string(),
            default_value,
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let registry = SchemaRegistry::builtin();

        assert_eq!(registry.len(), BUILTIN_CATALOG.len());
        assert_eq!(registry.version(), BUILTIN_CATALOG_VERSION);
        assert_eq!(
            registry.categories(),
            &["growth", "subscriptions", "advertising", "impressions", "events"]
        );
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = SchemaRegistry::builtin();
        let b = SchemaRegistry::builtin();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_lookup_known_key() {
        let registry = SchemaRegistry::builtin();

        let churn = registry.get_definition("monthly_churn_rate").unwrap();
        assert_eq!(churn.category, "subscriptions");
        assert_eq!(churn.unit, "percent");
        assert_eq!(registry.get_category("monthly_churn_rate"), Some("subscriptions"));
        assert_eq!(registry.get_default_value("monthly_churn_rate"), churn.default_value);
    }

    #[test]
    fn test_unknown_key_is_not_an_error() {
        let registry = SchemaRegistry::builtin();

        assert!(registry.get_definition("merch_margin").is_none());
        assert_eq!(registry.get_default_value("merch_margin"), 0.0);
        assert_eq!(registry.get_category("merch_margin"), None);
        assert!(registry.list_by_category("merchandise").is_empty());
    }

    #[test]
    fn test_list_by_category_keeps_declaration_order() {
        let registry = SchemaRegistry::new(
            1,
            vec![
                def("z_metric", "growth", 1.0),
                def("other", "events", 2.0),
                def("a_metric", "growth", 3.0),
            ],
        )
        .unwrap();

        let keys: Vec<&str> = registry
            .list_by_category("growth")
            .iter()
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(keys, vec!["z_metric", "a_metric"]);
        assert_eq!(registry.categories(), &["growth", "events"]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = SchemaRegistry::new(1, vec![def("churn", "a", 1.0), def("churn", "b", 2.0)]);
        assert!(matches!(result, Err(Error::Registry(_))));
    }

    #[test]
    fn test_zero_default_reads_as_absent() {
        let registry = SchemaRegistry::new(1, vec![def("setup_cost", "events", 0.0)]).unwrap();

        assert!(registry.get_definition("setup_cost").is_some());
        assert_eq!(registry.get_default_value("setup_cost"), 0.0);
    }
}
