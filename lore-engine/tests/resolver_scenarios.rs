//! Resolver behaviour against in-memory stores
//!
//! Covers tier precedence, the effective value fallback chain, revert on
//! delete, upsert idempotence, batch atomicity and category inference, plus
//! the churn walk-through: default -> benchmark -> override -> delete.

use lore_engine::store::{MemoryBenchmarkStore, MemoryOverrideStore};
use lore_engine::{
    AssumptionSource, BenchmarkValue, Error, MetricKey, Resolver, ResolverOptions,
    SaveAssumption, SchemaRegistry,
};
use std::sync::Arc;

const REGISTRY: &str = r#"
    version = 1

    [[category]]
    name = "growth"

    [[category.metric]]
    key = "growth_rate"
    unit = "percent"
    default = 8.0

    [[category]]
    name = "subscriptions"

    [[category.metric]]
    key = "churn"
    label = "Monthly churn"
    unit = "percent"
    default = 5.0

    [[category.metric]]
    key = "arpu"
    unit = "currency"
    default = 12.0

    [[category.metric]]
    key = "trial_length_days"
    unit = "count"
    default = 14.0
"#;

struct Fixture {
    benchmarks: Arc<MemoryBenchmarkStore>,
    overrides: Arc<MemoryOverrideStore>,
    resolver: Resolver,
}

fn fixture(benchmarks: Vec<BenchmarkValue>) -> Fixture {
    let registry = Arc::new(SchemaRegistry::from_toml_str(REGISTRY).unwrap());
    let benchmarks = Arc::new(MemoryBenchmarkStore::with_values(benchmarks));
    let overrides = Arc::new(MemoryOverrideStore::new());
    let resolver = Resolver::new(
        registry,
        benchmarks.clone(),
        overrides.clone(),
        ResolverOptions::default(),
    );
    Fixture {
        benchmarks,
        overrides,
        resolver,
    }
}

#[tokio::test]
async fn test_override_wins_when_all_tiers_present() {
    let f = fixture(vec![BenchmarkValue::new("churn", 3.2)]);
    f.resolver
        .save_assumption(SaveAssumption::new("churn", 2.0))
        .await
        .unwrap();

    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 2.0);
    assert_eq!(f.resolver.get_effective_value("churn", Some(99.0)).await.unwrap(), 2.0);
}

#[tokio::test]
async fn test_fallback_chain() {
    let f = fixture(vec![]);

    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 5.0);
    assert_eq!(f.resolver.get_effective_value("nowhere", Some(42.0)).await.unwrap(), 42.0);
    assert_eq!(f.resolver.get_effective_value("nowhere", None).await.unwrap(), 0.0);
}

#[tokio::test]
async fn test_delete_reverts_to_benchmark() {
    let f = fixture(vec![BenchmarkValue::new("churn", 3.2)]);

    f.resolver
        .save_assumption(SaveAssumption::new("churn", 10.0))
        .await
        .unwrap();
    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 10.0);

    f.resolver.delete_assumption("churn").await.unwrap();
    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 3.2);
}

#[tokio::test]
async fn test_delete_reverts_to_schema_default_without_benchmark() {
    let f = fixture(vec![]);

    f.resolver
        .save_assumption(SaveAssumption::new("arpu", 10.0))
        .await
        .unwrap();
    f.resolver.delete_assumption("arpu").await.unwrap();

    let arpu = f.resolver.get_assumption("arpu").await.unwrap().unwrap();
    assert_eq!(arpu.value, 12.0);
    assert_eq!(arpu.source, AssumptionSource::SchemaDefault);
}

#[tokio::test]
async fn test_delete_of_missing_override_is_noop() {
    let f = fixture(vec![]);
    f.resolver.delete_assumption("churn").await.unwrap();
    assert!(f.overrides.is_empty().await);
}

#[tokio::test]
async fn test_repeated_save_keeps_one_row() {
    let f = fixture(vec![]);

    f.resolver
        .save_assumption(SaveAssumption::new("churn", 10.0))
        .await
        .unwrap();
    f.resolver
        .save_assumption(SaveAssumption::new("churn", 10.0))
        .await
        .unwrap();

    let rows = f.resolver.list_overrides().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].metric_key, MetricKey::from("churn"));
    assert_eq!(rows[0].value, 10.0);
}

#[tokio::test]
async fn test_failed_batch_applies_nothing() {
    let f = fixture(vec![]);
    f.resolver
        .save_assumption(SaveAssumption::new("arpu", 15.0))
        .await
        .unwrap();

    f.overrides.set_fail_writes(true);
    let err = f
        .resolver
        .save_multiple_assumptions(vec![
            SaveAssumption::new("churn", 1.0),
            SaveAssumption::new("arpu", 2.0),
        ])
        .await
        .unwrap_err();
    f.overrides.set_fail_writes(false);

    assert!(matches!(err, Error::OverrideWriteFailed { .. }));
    assert_eq!(
        err.failed_keys(),
        &[MetricKey::from("churn"), MetricKey::from("arpu")]
    );
    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 5.0);
    assert_eq!(f.resolver.get_effective_value("arpu", None).await.unwrap(), 15.0);
}

#[tokio::test]
async fn test_successful_batch_applies_everything() {
    let f = fixture(vec![]);

    f.resolver
        .save_multiple_assumptions(vec![
            SaveAssumption::new("churn", 1.0),
            SaveAssumption::new("growth_rate", 12.0),
            SaveAssumption::new("podcast_rpm", 25.0),
        ])
        .await
        .unwrap();

    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 1.0);
    assert_eq!(f.resolver.get_effective_value("growth_rate", None).await.unwrap(), 12.0);
    assert_eq!(f.resolver.get_effective_value("podcast_rpm", None).await.unwrap(), 25.0);

    let rpm = f.overrides.get("podcast_rpm").await.unwrap();
    assert_eq!(rpm.category, "general");
}

#[tokio::test]
async fn test_category_inferred_from_registry() {
    let f = fixture(vec![]);

    f.resolver
        .save_assumption(SaveAssumption::new("growth_rate", 11.0))
        .await
        .unwrap();

    let row = f.overrides.get("growth_rate").await.unwrap();
    assert_eq!(row.category, "growth");
    assert_eq!(row.unit.as_deref(), Some("percent"));
}

#[tokio::test]
async fn test_churn_walkthrough() {
    let f = fixture(vec![]);

    // Registry default only
    let churn = f.resolver.get_assumption("churn").await.unwrap().unwrap();
    assert_eq!(churn.value, 5.0);
    assert_eq!(churn.source, AssumptionSource::SchemaDefault);
    assert_eq!(churn.unit, "percent");

    // Benchmark published
    f.benchmarks.publish(BenchmarkValue::new("churn", 3.2)).await;
    f.resolver.refresh().await.unwrap();
    let churn = f.resolver.get_assumption("churn").await.unwrap().unwrap();
    assert_eq!(churn.value, 3.2);
    assert_eq!(churn.source, AssumptionSource::Benchmark);

    // Override saved with notes
    f.resolver
        .save_assumption(SaveAssumption::new("churn", 2.0).with_notes("revised Q3"))
        .await
        .unwrap();
    let churn = f.resolver.get_assumption("churn").await.unwrap().unwrap();
    assert_eq!(churn.value, 2.0);
    assert_eq!(churn.source, AssumptionSource::Override);
    assert_eq!(churn.benchmark_value, Some(3.2));
    assert_eq!(churn.notes.as_deref(), Some("revised Q3"));

    // Override deleted
    f.resolver.delete_assumption("churn").await.unwrap();
    let churn = f.resolver.get_assumption("churn").await.unwrap().unwrap();
    assert_eq!(churn.value, 3.2);
    assert_eq!(churn.source, AssumptionSource::Benchmark);
}

#[tokio::test]
async fn test_list_by_category_regardless_of_source_mix() {
    let f = fixture(vec![BenchmarkValue::new("arpu", 11.0)]);
    f.resolver
        .save_assumption(SaveAssumption::new("trial_length_days", 7.0))
        .await
        .unwrap();
    // Untracked key claiming the same category is not enumerable
    f.resolver
        .save_assumption(SaveAssumption::new("gift_share", 0.1).with_category("subscriptions"))
        .await
        .unwrap();

    let subs = f.resolver.list_by_category("subscriptions").await.unwrap();
    let listed: Vec<(&str, AssumptionSource)> = subs
        .iter()
        .map(|a| (a.metric_key.as_str(), a.source))
        .collect();

    assert_eq!(
        listed,
        vec![
            ("churn", AssumptionSource::SchemaDefault),
            ("arpu", AssumptionSource::Benchmark),
            ("trial_length_days", AssumptionSource::Override),
        ]
    );

    let gift = f.resolver.get_assumption("gift_share").await.unwrap().unwrap();
    assert_eq!(gift.category, "subscriptions");
}

#[tokio::test]
async fn test_stale_checked_save_is_rejected() {
    let f = fixture(vec![]);

    f.resolver
        .save_assumption_checked(SaveAssumption::new("churn", 4.0), 0)
        .await
        .unwrap();

    // A second editor still holding version 0
    let err = f
        .resolver
        .save_assumption_checked(SaveAssumption::new("churn", 6.0), 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StaleOverride { expected: 0, actual: 1, .. }));
    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 4.0);

    f.resolver
        .save_assumption_checked(SaveAssumption::new("churn", 6.0), 1)
        .await
        .unwrap();
    assert_eq!(f.resolver.get_effective_value("churn", None).await.unwrap(), 6.0);
}

#[tokio::test]
async fn test_withdrawn_benchmark_reverts_to_schema_default() {
    let f = fixture(vec![BenchmarkValue::new("arpu", 11.0)]);
    assert_eq!(f.resolver.get_effective_value("arpu", None).await.unwrap(), 11.0);

    f.benchmarks.withdraw("arpu").await;
    // Cached map still holds the benchmark until refreshed
    assert_eq!(f.resolver.get_effective_value("arpu", None).await.unwrap(), 11.0);

    f.resolver.refresh().await.unwrap();
    let arpu = f.resolver.get_assumption("arpu").await.unwrap().unwrap();
    assert_eq!(arpu.value, 12.0);
    assert_eq!(arpu.source, AssumptionSource::SchemaDefault);
    assert_eq!(arpu.benchmark_value, None);
}
