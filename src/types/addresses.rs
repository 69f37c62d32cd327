//! Network identifiers and well-known contract addresses

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Multicall3, deployed at the same address on every supported chain
pub const MULTICALL3: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Polygon,
    Bsc,
    Fantom,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Polygon => 137,
            Network::Bsc => 56,
            Network::Fantom => 250,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Polygon => write!(f, "polygon"),
            Network::Bsc => write!(f, "bsc"),
            Network::Fantom => write!(f, "fantom"),
        }
    }
}

/// Price lookup category understood by the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleNamespace {
    Tokens,
    Lps,
}

impl std::fmt::Display for OracleNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleNamespace::Tokens => write!(f, "tokens"),
            OracleNamespace::Lps => write!(f, "lps"),
        }
    }
}
