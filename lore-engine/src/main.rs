//! lore - command-line access to effective planning assumptions
//!
//! Thin shell over [`lore_engine::Resolver`] backed by the SQLite stores.
//! Output is JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lore_common::config::LoreConfig;
use lore_common::db::init_database;
use lore_engine::store::{SqliteBenchmarkStore, SqliteOverrideStore};
use lore_engine::{BenchmarkValue, Resolver, ResolverOptions, SaveAssumption, SchemaRegistry};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lore", version, about = "Layered override resolution for planning assumptions")]
struct Cli {
    /// Root folder holding the database (overrides LORE_ROOT and config)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (overrides LORE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List effective assumptions, optionally for one registry category
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one effective assumption and its effective value
    Get {
        key: String,
        /// Value returned when no tier supplies one
        #[arg(long)]
        fallback: Option<f64>,
    },
    /// Save an override
    Set {
        key: String,
        value: f64,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Reject the write unless the stored override is at this version (0 = none yet)
        #[arg(long)]
        expect_version: Option<i64>,
    },
    /// Remove an override, reverting to benchmark or registry default
    Delete { key: String },
    /// List registry categories in display order
    Categories,
    /// Upsert benchmark values from a JSON array of {metric_key, value, unit?}
    ImportBenchmarks { file: PathBuf },
}

#[derive(Serialize)]
struct GetOutput<T: Serialize> {
    effective_value: f64,
    assumption: Option<T>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = LoreConfig::load(cli.root.as_deref(), cli.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        "Starting lore v{} (root {})",
        env!("CARGO_PKG_VERSION"),
        config.root_folder.display()
    );
    // Config is read before the subscriber exists; report its source now
    config.log_source();

    config.ensure_root_folder()?;
    let pool = init_database(&config.database_path())
        .await
        .context("Failed to open database")?;

    let registry = match config.schema_path() {
        Some(path) => Arc::new(
            SchemaRegistry::from_path(&path)
                .with_context(|| format!("Failed to load registry {}", path.display()))?,
        ),
        None => SchemaRegistry::builtin(),
    };
    info!(version = registry.version(), metrics = registry.len(), "Registry loaded");

    let benchmark_store = Arc::new(SqliteBenchmarkStore::new(pool.clone()));
    let override_store = Arc::new(SqliteOverrideStore::new(pool));
    let resolver = Resolver::new(
        registry,
        benchmark_store.clone(),
        override_store,
        ResolverOptions::from(&config),
    );

    match cli.command {
        Command::List { category } => {
            let assumptions = match category {
                Some(category) => resolver.list_by_category(&category).await?,
                None => resolver.snapshot().await?.iter().cloned().collect(),
            };
            print_json(&assumptions)?;
        }
        Command::Get { key, fallback } => {
            let map = resolver.snapshot().await?;
            print_json(&GetOutput {
                effective_value: map.effective_value(&key, fallback),
                assumption: map.get_assumption(&key),
            })?;
        }
        Command::Set {
            key,
            value,
            unit,
            category,
            notes,
            expect_version,
        } => {
            let input = SaveAssumption {
                metric_key: key.clone().into(),
                value,
                unit,
                category,
                notes,
            };
            match expect_version {
                Some(version) => resolver.save_assumption_checked(input, version).await?,
                None => resolver.save_assumption(input).await?,
            }
            print_json(&resolver.get_assumption(&key).await?)?;
        }
        Command::Delete { key } => {
            resolver.delete_assumption(&key).await?;
            print_json(&resolver.get_assumption(&key).await?)?;
        }
        Command::Categories => {
            print_json(&resolver.registry().categories())?;
        }
        Command::ImportBenchmarks { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let values: Vec<BenchmarkValue> =
                serde_json::from_str(&content).context("Invalid benchmark JSON")?;
            let count = benchmark_store.import(&values).await?;
            print_json(&serde_json::json!({ "imported": count }))?;
        }
    }

    Ok(())
}
