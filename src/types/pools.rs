//! Pool configuration and per-run on-chain snapshots

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use super::{Network, OracleNamespace};

pub const DEFAULT_LP_DECIMALS: u32 = 18;

/// One yield position inside a staking contract. Supplied by configuration,
/// never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub network: Network,
    pub name: String,
    pub staking_contract: Address,
    /// LP or single-asset token staked in the contract
    pub address: Address,
    pub pool_id: u64,
    pub oracle: Option<OracleNamespace>,
    pub oracle_id: Option<String>,
    pub decimals: Option<u32>,
}

impl Pool {
    pub fn price_namespace(&self) -> OracleNamespace {
        self.oracle.unwrap_or(OracleNamespace::Lps)
    }

    pub fn price_id(&self) -> &str {
        self.oracle_id.as_deref().unwrap_or(&self.name)
    }

    pub fn token_decimals(&self) -> u32 {
        self.decimals.unwrap_or(DEFAULT_LP_DECIMALS)
    }
}

/// Pool record as it appears in the sources file; network and staking
/// contract come from the enclosing source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEntry {
    pub name: String,
    pub address: Address,
    pub pool_id: u64,
    #[serde(default)]
    pub oracle: Option<OracleNamespace>,
    #[serde(default)]
    pub oracle_id: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
}

impl PoolEntry {
    pub fn into_pool(self, network: Network, staking_contract: Address) -> Pool {
        Pool {
            network,
            name: self.name,
            staking_contract,
            address: self.address,
            pool_id: self.pool_id,
            oracle: self.oracle,
            oracle_id: self.oracle_id,
            decimals: self.decimals,
        }
    }
}

/// Raw on-chain reads for one pool, taken in a single batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSnapshot {
    pub staked_balance: U256,
    pub alloc_point: U256,
    pub total_alloc_point: U256,
    pub bonus_alloc_point: Option<U256>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(oracle_id: Option<&str>) -> PoolEntry {
        PoolEntry {
            name: "sushi-wmatic-weth".to_string(),
            address: Address::repeat_byte(0x11),
            pool_id: 0,
            oracle: None,
            oracle_id: oracle_id.map(String::from),
            decimals: None,
        }
    }

    #[test]
    fn test_price_defaults() {
        let pool = entry(None).into_pool(Network::Polygon, Address::repeat_byte(0x22));
        assert_eq!(pool.price_namespace(), OracleNamespace::Lps);
        assert_eq!(pool.price_id(), "sushi-wmatic-weth");
        assert_eq!(pool.token_decimals(), 18);
        assert_eq!(pool.staking_contract, Address::repeat_byte(0x22));
    }

    #[test]
    fn test_oracle_override() {
        let pool = entry(Some("WMATIC")).into_pool(Network::Polygon, Address::ZERO);
        assert_eq!(pool.price_id(), "WMATIC");
    }

    #[test]
    fn test_entry_deserializes_camel_case() {
        let json = r#"{
            "name": "ape-banana-bnb",
            "address": "0xF65C1C0478eFDe3c19b49EcBE7ACc57BB6B1D713",
            "poolId": 1,
            "oracle": "tokens",
            "oracleId": "BANANA",
            "decimals": 18
        }"#;
        let entry: PoolEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.pool_id, 1);
        assert_eq!(entry.oracle, Some(OracleNamespace::Tokens));
        assert_eq!(entry.oracle_id.as_deref(), Some("BANANA"));
    }
}
