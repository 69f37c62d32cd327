//! Protocol fetchers: one per staking contract and its pool set

pub mod abi;
pub mod masterchef;
pub mod minichef;
pub mod trading_fees;

pub use masterchef::*;
pub use minichef::*;
pub use trading_fees::*;

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use futures::future::join_all;
use rust_decimal::Decimal;
use crate::{
    errors::{ApyError, ApyResult},
    network::{RawResult, ReadCall},
    oracle::{optional_price, PriceOracle},
    types::{Pool, SourceYields},
    utils::{to_token_units, u256_to_decimal, MAX_DECIMALS},
};
use abi::{IERC20, IMasterChef};

#[async_trait]
pub trait ProtocolFetcher: Send + Sync {
    fn id(&self) -> &str;

    async fn fetch(&self) -> ApyResult<SourceYields>;
}

/// Word `word` of the `index`-th batch result; a revert or short return is
/// a contract-level failure for the whole fetcher.
pub(crate) fn required_word(
    results: &[RawResult],
    index: usize,
    word: usize,
    contract: Address,
    what: &str,
) -> ApyResult<U256> {
    results
        .get(index)
        .and_then(|result| result.word(word))
        .ok_or_else(|| ApyError::contract(contract, format!("{} reverted or returned no data", what)))
}

pub(crate) fn required_decimal(value: U256, contract: Address, what: &str) -> ApyResult<Decimal> {
    u256_to_decimal(value)
        .ok_or_else(|| ApyError::contract(contract, format!("{} out of decimal range: {}", what, value)))
}

/// `balanceOf(chef)` on the staked token and `poolInfo(pid)` on the chef
pub(crate) fn staking_calls(chef: Address, pool: &Pool) -> [ReadCall; 2] {
    [
        ReadCall::new(pool.address, IERC20::balanceOfCall { account: chef }.abi_encode()),
        ReadCall::new(chef, IMasterChef::poolInfoCall { pid: U256::from(pool.pool_id) }.abi_encode()),
    ]
}

/// Oracle prices of the staked tokens, looked up concurrently. A missing
/// price leaves that pool's slot empty.
pub(crate) async fn staked_token_prices(
    oracle: &dyn PriceOracle,
    pools: &[Pool],
) -> ApyResult<Vec<Option<Decimal>>> {
    let lookups = pools
        .iter()
        .map(|pool| oracle.price(pool.price_namespace(), pool.price_id()));

    join_all(lookups).await.into_iter().map(optional_price).collect()
}

/// Share of yield kept after `fee`; only fees in [0, 1) are accepted
pub(crate) fn retention_for(source: &str, fee: Decimal) -> ApyResult<Decimal> {
    if fee < Decimal::ZERO || fee >= Decimal::ONE {
        return Err(ApyError::Configuration(format!(
            "{}: performance fee {} outside [0, 1)",
            source, fee
        )));
    }
    Ok(Decimal::ONE - fee)
}

pub(crate) fn check_decimals(source: &str, what: &str, decimals: u32) -> ApyResult<()> {
    if decimals > MAX_DECIMALS {
        return Err(ApyError::Configuration(format!(
            "{}: {} decimals {} exceed {}",
            source, what, decimals, MAX_DECIMALS
        )));
    }
    Ok(())
}

pub(crate) fn check_pool_decimals(source: &str, pools: &[Pool]) -> ApyResult<()> {
    pools
        .iter()
        .try_for_each(|pool| check_decimals(source, &pool.name, pool.token_decimals()))
}

pub(crate) fn staked_usd(balance: U256, decimals: u32, price: Decimal) -> Option<Decimal> {
    to_token_units(balance, decimals)?.checked_mul(price)
}
