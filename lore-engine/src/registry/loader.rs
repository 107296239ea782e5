//! TOML registry format
//!
//! Categories and metrics are arrays of tables so declaration order survives
//! deserialization:
//!
//! ```toml
//! version = 2
//!
//! [[category]]
//! name = "subscriptions"
//!
//! [[category.metric]]
//! key = "monthly_churn_rate"
//! label = "Monthly subscriber churn"
//! unit = "percent"
//! default = 5.0
//! ```

use super::SchemaRegistry;
use crate::error::{Error, Result};
use crate::types::{MetricDefinition, MetricKey, FALLBACK_UNIT};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    category: Vec<CategoryFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryFile {
    name: String,
    #[serde(default)]
    metric: Vec<MetricFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MetricFile {
    key: String,
    label: Option<String>,
    unit: Option<String>,
    #[serde(default)]
    default: f64,
}

fn default_version() -> u32 {
    1
}

pub(super) fn parse(content: &str) -> Result<SchemaRegistry> {
    let file: RegistryFile =
        toml::from_str(content).map_err(|e| Error::Registry(format!("invalid registry TOML: {}", e)))?;

    let mut definitions = Vec::new();
    for category in file.category {
        if category.name.trim().is_empty() {
            return Err(Error::Registry("category name must not be empty".to_string()));
        }
        for metric in category.metric {
            if metric.key.trim().is_empty() {
                return Err(Error::Registry(format!(
                    "empty metric key in category {}",
                    category.name
                )));
            }
            definitions.push(MetricDefinition {
                label: metric.label.unwrap_or_else(|| metric.key.clone()),
                key: MetricKey::from(metric.key),
                category: category.name.clone(),
                unit: metric.unit.unwrap_or_else(|| FALLBACK_UNIT.to_string()),
                default_value: metric.default,
            });
        }
    }

    SchemaRegistry::new(file.version, definitions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        version = 3

        [[category]]
        name = "subscriptions"

        [[category.metric]]
        key = "churn"
        label = "Churn"
        unit = "percent"
        default = 5.0

        [[category.metric]]
        key = "arpu"
        unit = "currency"
        default = 12.5

        [[category]]
        name = "growth"

        [[category.metric]]
        key = "growth_rate"
    "#;

    #[test]
    fn test_parse_preserves_order_and_fills_defaults() {
        let registry = SchemaRegistry::from_toml_str(SAMPLE).unwrap();

        assert_eq!(registry.version(), 3);
        assert_eq!(registry.categories(), &["subscriptions", "growth"]);

        let keys: Vec<&str> = registry
            .list_by_category("subscriptions")
            .iter()
            .map(|d| d.key.as_str())
            .collect();
        assert_eq!(keys, vec!["churn", "arpu"]);

        let arpu = registry.get_definition("arpu").unwrap();
        assert_eq!(arpu.label, "arpu");

        let growth = registry.get_definition("growth_rate").unwrap();
        assert_eq!(growth.unit, FALLBACK_UNIT);
        assert_eq!(growth.default_value, 0.0);
    }

    #[test]
    fn test_version_defaults_to_one() {
        let registry = SchemaRegistry::from_toml_str("").unwrap();
        assert_eq!(registry.version(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_across_categories_rejected() {
        let content = r#"
            [[category]]
            name = "a"
            [[category.metric]]
            key = "churn"

            [[category]]
            name = "b"
            [[category.metric]]
            key = "churn"
        "#;
        assert!(matches!(
            SchemaRegistry::from_toml_str(content),
            Err(Error::Registry(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let content = r#"
            [[category]]
            name = "a"
            [[category.metric]]
            key = "churn"
            defualt = 5.0
        "#;
        assert!(SchemaRegistry::from_toml_str(content).is_err());
    }
}
