//! Fincache operator CLI.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use fincache::metrics::register_cache_metrics;
use fincache::{FastTierConfig, FastTierStore, InvalidationEngine};
use fincache_core::CacheValue;
use serde_json::json;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fincache", version, about = "Inspect and maintain the fast tier cache")]
struct Cli {
    /// Optional TOML configuration file; `FINCACHE__*` variables override it.
    #[arg(short, long, global = true, env = "FINCACHE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show key count, memory footprint and hit rate.
    Stats,
    /// Print the decoded value stored under a key.
    Get { key: String },
    /// Store a JSON value under a key.
    Set {
        key: String,
        /// Value as JSON text, e.g. `[1.5, 2]` or `{"total": 10}`.
        value: String,
        /// Time to live in seconds.
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Remove a single key.
    Delete { key: String },
    /// Remove every key matching a glob pattern.
    Purge { pattern: String },
    /// Remove every entry of one owner across the registered namespaces.
    Invalidate { owner_id: String },
    /// Remove every entry in the store.
    Clear {
        /// Required confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs a stderr; stdout queda para el JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    register_cache_metrics();

    let config = FastTierConfig::load_or_default(cli.config.as_deref());
    tracing::debug!(url = %config.redacted_url(), backend = ?config.backend, "Configuration loaded");

    let store = FastTierStore::connect(&config).await;

    let output = match cli.command {
        Command::Stats => serde_json::to_value(store.stats().await)?,
        Command::Get { key } => {
            let value = store.get(&key).await;
            json!({ "key": key, "value": value })
        },
        Command::Set { key, value, ttl } => {
            let parsed: serde_json::Value =
                serde_json::from_str(&value).context("value is not valid JSON")?;
            let value = CacheValue::try_from(parsed)?;
            let stored = store.set(&key, &value, ttl.map(Duration::from_secs)).await;
            json!({ "key": key, "stored": stored })
        },
        Command::Delete { key } => {
            let deleted = store.delete(&key).await;
            json!({ "key": key, "deleted": deleted })
        },
        Command::Purge { pattern } => {
            let removed = store.delete_by_pattern(&pattern).await;
            json!({ "pattern": pattern, "removed": removed })
        },
        Command::Invalidate { owner_id } => {
            let engine = InvalidationEngine::with_default_namespaces(store.clone());
            let result = engine.invalidate(&engine.registry().scope(owner_id)).await;
            serde_json::to_value(result)?
        },
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear the fast tier without --yes");
            }
            json!({ "cleared": store.clear_all().await })
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
