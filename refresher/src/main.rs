//! Ratekeeper rate refresher
//!
//! Loads a provider "latest rates" payload into the conversion rate store.
//! Fetching the payload from the provider is left to the caller.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ratekeeper_common::Currency;
use ratekeeper_fx::{FxEngine, PgRateRepository, RateTable, RatesSnapshot};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::RefresherConfig;

/// Ratekeeper rate refresher CLI
#[derive(Parser, Debug)]
#[command(name = "update-rates")]
#[command(about = "Load provider conversion rates into the rate store")]
struct Args {
    /// Provider payload to load
    #[arg(required_unless_present = "list")]
    snapshot: Option<PathBuf>,

    /// Print the stored rates instead of updating them
    #[arg(long, conflicts_with = "snapshot")]
    list: bool,

    /// Check the payload without writing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = RefresherConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let snapshot = match &args.snapshot {
        Some(path) => {
            let payload = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let snapshot = checked_snapshot(&payload, config.fx.base_currency.as_ref())?;
            info!(
                path = %path.display(),
                base = %snapshot.base,
                currencies = snapshot.len(),
                published_at = ?snapshot.published_at(),
                "Loaded rates snapshot"
            );
            Some(snapshot)
        }
        None => None,
    };

    if args.dry_run {
        info!("Dry run, nothing written");
        return Ok(());
    }

    let repository = PgRateRepository::connect(&config.database_url, config.max_connections)
        .await
        .context("connecting to the rate store")?;
    repository.migrate().await?;
    let engine = FxEngine::new(Arc::new(repository), config.fx.clone());

    match snapshot {
        Some(snapshot) => {
            let written = engine.update_rates(snapshot.into_rates()).await?;
            info!(written, "Conversion rates stored");
        }
        None => {
            let table = engine.get_rates(true).await?;
            print!("{}", render_table(&table));
        }
    }

    Ok(())
}

/// Parse a provider payload and check it is quoted against `base`.
fn checked_snapshot(payload: &str, base: Option<&Currency>) -> anyhow::Result<RatesSnapshot> {
    let snapshot = RatesSnapshot::from_json(payload)?;
    let base = base.context("BASE_CURRENCY must be set to store rates")?;
    snapshot.ensure_base(base)?;
    if snapshot.is_empty() {
        warn!(base = %base, "Snapshot carries no rates");
    }
    Ok(snapshot)
}

/// One `CODE<TAB>RATE<TAB>UPDATED_AT` line per stored rate, sorted by code.
fn render_table(table: &RateTable) -> String {
    table
        .currencies()
        .iter()
        .filter_map(|currency| table.get(currency))
        .map(|rate| {
            format!(
                "{}\t{}\t{}\n",
                rate.to_currency,
                rate.rate,
                rate.updated_at.to_rfc3339()
            )
        })
        .collect()
}
