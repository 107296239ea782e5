//! # LORE Engine
//!
//! Layered override resolution for planning assumptions. Three tiers feed one
//! effective value per metric key, highest precedence first:
//!
//! 1. User override (the only tier this crate writes)
//! 2. Organizational benchmark (read-only, maintained by an external import)
//! 3. Schema registry default (static, loaded once)
//!
//! [`Resolver`] fetches the two stored tiers concurrently, merges them over the
//! [`SchemaRegistry`] and mediates every override write.
//!
//! Concurrent saves of the same key are last-write-wins at the store unless the
//! caller opts into [`Resolver::save_assumption_checked`].

pub mod error;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod types;

pub use error::{Error, Result, StoreFailure};
pub use registry::SchemaRegistry;
pub use resolver::{merge, EffectiveMap, Resolver, ResolverOptions};
pub use store::{BenchmarkStore, OverrideStore};
pub use types::{
    AssumptionSource, BenchmarkValue, EffectiveAssumption, MetricDefinition, MetricKey,
    OverrideValue, OverrideWrite, SaveAssumption,
};
