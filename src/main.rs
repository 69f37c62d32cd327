//! Farm APY - Main Entry Point
//!
//! Periodically aggregates yield farm APYs across Polygon, BSC and Fantom

use farm_apy::*;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;
use tracing::{error, info};
use farm_apy::{
    aggregator::SourceAggregator,
    network::{BatchedChainReader, Multicall3Reader},
    oracle::{HttpPriceOracle, PriceOracle},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let config = CONFIG.clone();

    // Initialize logging
    let _logging_guard = utils::setup_logging(&config.log_dir)?;

    info!("🌾 Farm APY v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration:");
    info!("   Sources file: {}", config.sources_file);
    info!("   Price API: {}", config.price_api_url);
    info!("   Performance fee: {} (retention {})", config.performance_fee, config.retention_factor());
    info!("   Request timeout: {}s", config.request_timeout_secs);
    if config.run_once {
        info!("   Mode: single run");
    } else {
        info!("   Refresh interval: {}s", config.refresh_interval_secs);
    }

    let sources = registry::load_sources(&config.sources_file)?;
    if sources.is_empty() {
        return Err(anyhow::anyhow!("No sources configured in {}", config.sources_file));
    }

    // Setup one provider and batched reader per network in use
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let mut readers: HashMap<Network, Arc<dyn BatchedChainReader>> = HashMap::new();
    for network in registry::networks_in_use(&sources) {
        let provider = network::setup_provider(network, config.rpc_url(network)).await?;
        readers.insert(network, Arc::new(Multicall3Reader::new(network, provider, timeout)));
    }

    let oracle: Arc<dyn PriceOracle> = Arc::new(HttpPriceOracle::new(
        &config.price_api_url,
        timeout,
        Duration::from_secs(config.price_cache_secs),
    )?);

    let fetchers = registry::build_fetchers(sources, &readers, oracle, config.performance_fee)?;
    let aggregator = SourceAggregator::new(fetchers);
    info!("✅ Registered {} sources on {} networks", aggregator.source_count(), readers.len());

    if config.run_once {
        run_cycle(&aggregator, &config).await;
        return Ok(());
    }

    // Setup shutdown handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("\n📛 Received shutdown signal (Ctrl+C)...");
        let _ = shutdown_tx.send(());
    });

    info!("\n🚀 Starting aggregation loop...\n");

    let start_time = Instant::now();
    let mut runs: u64 = 0;
    let mut interval = time::interval(Duration::from_secs(config.refresh_interval_secs));
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_cycle(&aggregator, &config).await;
                runs += 1;
            }
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received, exiting main loop...");
                break;
            }
        }
    }

    info!("\n🛑 Shutting down gracefully...");
    info!("   Total runtime: {:?}", start_time.elapsed());
    info!("   Aggregation runs: {}", runs);

    Ok(())
}

/// Run one aggregation and report it
async fn run_cycle(aggregator: &SourceAggregator, config: &Config) {
    let outcome = aggregator.aggregate().await;
    utils::print_outcome_summary(&outcome);

    if config.print_json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize outcome: {}", e),
        }
    }
}
