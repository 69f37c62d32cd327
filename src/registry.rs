//! Source registry: loads the pool configuration file and builds fetchers

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::info;
use crate::{
    errors::{ApyError, ApyResult},
    fetchers::{
        MasterChefFetcher, MasterChefParams, MiniChefFetcher, MiniChefParams, NoTradingFees,
        ProtocolFetcher, StaticTradingFees, TradingFeeSource,
    },
    network::BatchedChainReader,
    oracle::PriceOracle,
    types::Network,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "family", rename_all = "camelCase")]
pub enum SourceConfig {
    MasterChef(MasterChefParams),
    MiniChef(MiniChefParams),
}

impl SourceConfig {
    pub fn id(&self) -> &str {
        match self {
            SourceConfig::MasterChef(params) => &params.id,
            SourceConfig::MiniChef(params) => &params.id,
        }
    }

    pub fn network(&self) -> Network {
        match self {
            SourceConfig::MasterChef(params) => params.network,
            SourceConfig::MiniChef(params) => params.network,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
}

pub fn parse_sources(json: &str) -> ApyResult<Vec<SourceConfig>> {
    let file: SourcesFile = serde_json::from_str(json)
        .map_err(|e| ApyError::parsing("sources file", e))?;
    Ok(file.sources)
}

pub fn load_sources(path: &str) -> ApyResult<Vec<SourceConfig>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| ApyError::Configuration(format!("Cannot read {}: {}", path, e)))?;
    parse_sources(&json)
}

pub fn networks_in_use(sources: &[SourceConfig]) -> BTreeSet<Network> {
    sources.iter().map(SourceConfig::network).collect()
}

fn trading_fee_source(aprs: &HashMap<alloy::primitives::Address, Decimal>) -> Arc<dyn TradingFeeSource> {
    if aprs.is_empty() {
        Arc::new(NoTradingFees)
    } else {
        Arc::new(StaticTradingFees::new(aprs.clone()))
    }
}

/// One fetcher per source, in file order. Every source's network needs a
/// reader.
pub fn build_fetchers(
    sources: Vec<SourceConfig>,
    readers: &HashMap<Network, Arc<dyn BatchedChainReader>>,
    oracle: Arc<dyn PriceOracle>,
    default_performance_fee: Decimal,
) -> ApyResult<Vec<Arc<dyn ProtocolFetcher>>> {
    let mut fetchers: Vec<Arc<dyn ProtocolFetcher>> = Vec::with_capacity(sources.len());

    for source in sources {
        let reader = readers.get(&source.network()).cloned().ok_or_else(|| {
            ApyError::Configuration(format!("{}: no reader for {}", source.id(), source.network()))
        })?;

        let fetcher: Arc<dyn ProtocolFetcher> = match source {
            SourceConfig::MasterChef(params) => {
                let trading_fees = trading_fee_source(&params.trading_aprs);
                Arc::new(MasterChefFetcher::new(
                    params,
                    default_performance_fee,
                    reader,
                    oracle.clone(),
                    trading_fees,
                )?)
            }
            SourceConfig::MiniChef(params) => {
                let trading_fees = trading_fee_source(&params.trading_aprs);
                Arc::new(MiniChefFetcher::new(
                    params,
                    default_performance_fee,
                    reader,
                    oracle.clone(),
                    trading_fees,
                )?)
            }
        };

        info!("📋 Registered source {}", fetcher.id());
        fetchers.push(fetcher);
    }

    Ok(fetchers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: &str = r#"{
        "sources": [
            {
                "family": "miniChef",
                "id": "sushi-polygon",
                "network": "polygon",
                "chef": "0x0769fd68dFb93167989C6f7254cd0D766Fb2841F",
                "rewardOracleId": "SUSHI",
                "rewarder": "0xa3378Ca78633B3b9b2255EAa26748770211163AE",
                "bonusOracleId": "WMATIC",
                "lpFee": 0.0025,
                "pools": []
            },
            {
                "family": "masterChef",
                "id": "spooky-fantom",
                "network": "fantom",
                "chef": "0x2b2929E785374c651a81A63878Ab22742656DcDd",
                "rewardRateFn": "booPerSecond",
                "cadence": { "kind": "perSecond" },
                "rewardOracleId": "BOO",
                "pools": []
            }
        ]
    }"#;

    #[test]
    fn test_parse_sources() {
        let sources = parse_sources(SOURCES).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id(), "sushi-polygon");
        assert!(matches!(sources[0], SourceConfig::MiniChef(_)));
        assert_eq!(sources[1].network(), Network::Fantom);

        let networks = networks_in_use(&sources);
        assert_eq!(networks.into_iter().collect::<Vec<_>>(), vec![Network::Polygon, Network::Fantom]);
    }

    #[test]
    fn test_unknown_family_is_rejected() {
        let json = r#"{ "sources": [ { "family": "vault", "id": "x" } ] }"#;
        assert!(matches!(parse_sources(json), Err(ApyError::DataParsing { .. })));
    }

    #[test]
    fn test_bundled_sources_file_parses() {
        let json = include_str!("../data/sources.json");
        let sources = parse_sources(json).unwrap();
        assert!(!sources.is_empty());

        let ape = sources
            .iter()
            .find_map(|source| match source {
                SourceConfig::MasterChef(params) if params.id == "ape-bsc" => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(ape.compoundings_per_year, crate::config::BASE_HPY);
        assert!(!ape.with_breakdowns);
    }
}
