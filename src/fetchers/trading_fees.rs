//! Trading-fee APR overlay

use alloy::primitives::Address;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use crate::errors::ApyResult;

/// Swap-fee APR per LP pair. Pairs missing from the returned map earn no
/// trading APR.
#[async_trait]
pub trait TradingFeeSource: Send + Sync {
    async fn trading_aprs(&self, pairs: &[Address]) -> ApyResult<HashMap<Address, Decimal>>;
}

pub struct NoTradingFees;

#[async_trait]
impl TradingFeeSource for NoTradingFees {
    async fn trading_aprs(&self, _pairs: &[Address]) -> ApyResult<HashMap<Address, Decimal>> {
        Ok(HashMap::new())
    }
}

/// Fixed APRs supplied with the source configuration
pub struct StaticTradingFees {
    aprs: HashMap<Address, Decimal>,
}

impl StaticTradingFees {
    pub fn new(aprs: HashMap<Address, Decimal>) -> Self {
        Self { aprs }
    }
}

#[async_trait]
impl TradingFeeSource for StaticTradingFees {
    async fn trading_aprs(&self, pairs: &[Address]) -> ApyResult<HashMap<Address, Decimal>> {
        Ok(pairs
            .iter()
            .filter_map(|pair| self.aprs.get(pair).map(|apr| (*pair, *apr)))
            .collect())
    }
}
