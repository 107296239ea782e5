//! Error types for the resolution engine
//!
//! Fetch and write failures from the stores are never recovered here; they
//! propagate to the caller, who owns retry policy. An unregistered metric key
//! is not an error anywhere in this crate.

use crate::types::MetricKey;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Underlying cause of a store failure
#[derive(Debug, Error)]
pub enum StoreFailure {
    /// Database operation error (wraps sqlx::Error)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Benchmark tier could not be read. Never treated as "no benchmarks".
    #[error("Benchmark fetch failed: {0}")]
    BenchmarkFetchFailed(#[source] StoreFailure),

    /// Override tier could not be read
    #[error("Override fetch failed: {0}")]
    OverrideFetchFailed(#[source] StoreFailure),

    /// Save or delete failed; `keys` lists every key of the attempted write
    #[error("Override write failed for [{}]: {source}", join_keys(.keys))]
    OverrideWriteFailed {
        keys: Vec<MetricKey>,
        #[source]
        source: StoreFailure,
    },

    /// Optimistic write rejected because the stored row moved on
    #[error("Stale override for {key}: expected version {expected}, found {actual}")]
    StaleOverride {
        key: MetricKey,
        expected: i64,
        actual: i64,
    },

    /// Registry definition could not be loaded
    #[error("Registry error: {0}")]
    Registry(String),

    /// lore-common error
    #[error(transparent)]
    Common(#[from] lore_common::Error),
}

impl Error {
    /// Build an `OverrideWriteFailed` for the given keys
    pub fn write_failed<I>(keys: I, source: impl Into<StoreFailure>) -> Self
    where
        I: IntoIterator<Item = MetricKey>,
    {
        Error::OverrideWriteFailed {
            keys: keys.into_iter().collect(),
            source: source.into(),
        }
    }

    /// Keys a failed write attempted, for exact retry
    pub fn failed_keys(&self) -> &[MetricKey] {
        match self {
            Error::OverrideWriteFailed { keys, .. } => keys,
            Error::StaleOverride { key, .. } => std::slice::from_ref(key),
            _ => &[],
        }
    }
}

fn join_keys(keys: &[MetricKey]) -> String {
    keys.iter()
        .map(MetricKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
