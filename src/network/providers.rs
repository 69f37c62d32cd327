//! RPC provider setup per network

use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    network::retry::StartupRetry,
    types::Network,
    ConcreteProvider,
};

pub async fn setup_provider(network: Network, rpc_url: &str) -> Result<Arc<ConcreteProvider>> {
    let provider: Arc<ConcreteProvider> = Arc::new(
        ProviderBuilder::new()
            .on_http(rpc_url.parse()?)
            .boxed()
    );

    info!("🔗 Testing connection to {}...", network);
    let chain_id = StartupRetry::default()
        .run(&format!("{} connection", network), || async {
            provider.get_chain_id().await
                .context("Failed to get chain id")
        })
        .await
        .map_err(|e| {
            warn!("⚠️ Connection to {} failed: {}", network, e);
            anyhow::anyhow!("Network connection failed: {}", e)
        })?;

    if chain_id != network.chain_id() {
        return Err(anyhow::anyhow!(
            "RPC for {} reports chain id {} (expected {})",
            network, chain_id, network.chain_id()
        ));
    }

    info!("✅ Connected to {} (chain id {})", network, chain_id);
    Ok(provider)
}
