//! MasterChef family: one reward token shared by allocation weight

use alloy::{
    primitives::{Address, U256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use super::{
    abi::{getter_call, IMasterChef},
    check_decimals, check_pool_decimals, required_decimal, required_word, retention_for,
    staked_token_prices, staked_usd, staking_calls,
    ProtocolFetcher, TradingFeeSource,
};
use crate::{
    config::MINUTELY_HPY,
    errors::{ApyError, ApyResult},
    network::{BatchedChainReader, ReadCall},
    oracle::{optional_price, PriceOracle},
    types::{AllocationSnapshot, Network, OracleNamespace, Pool, PoolEntry, RewardFlow, SourceYields, YieldResult},
    yields::{allocation_share, annualize, compose_yield, simple_apr, yearly_reward, CompoundingPolicy, EmissionCadence},
};

fn default_tokens() -> OracleNamespace {
    OracleNamespace::Tokens
}

fn default_decimals() -> u32 {
    18
}

fn default_alloc_point_index() -> usize {
    1
}

fn default_masterchef_hpy() -> u64 {
    MINUTELY_HPY
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterChefParams {
    pub id: String,
    pub network: Network,
    pub chef: Address,
    /// Emission getter, e.g. `cakePerBlock`
    pub reward_rate_fn: String,
    pub cadence: EmissionCadence,
    #[serde(default)]
    pub has_multiplier: bool,
    /// Word of the `poolInfo` tuple holding the allocation weight
    #[serde(default = "default_alloc_point_index")]
    pub alloc_point_index: usize,
    #[serde(default = "default_tokens")]
    pub reward_oracle: OracleNamespace,
    pub reward_oracle_id: String,
    #[serde(default = "default_decimals")]
    pub reward_decimals: u32,
    #[serde(default = "default_masterchef_hpy")]
    pub compoundings_per_year: u64,
    #[serde(default)]
    pub lp_fee: Decimal,
    #[serde(default)]
    pub with_breakdowns: bool,
    #[serde(default)]
    pub performance_fee: Option<Decimal>,
    #[serde(default)]
    pub trading_aprs: HashMap<Address, Decimal>,
    pub pools: Vec<PoolEntry>,
}

/// Contract-level values shared by every pool of one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChefState {
    emission: Decimal,
    total_alloc_point: U256,
    multiplier: Option<Decimal>,
}

pub struct MasterChefFetcher {
    id: String,
    chef: Address,
    reward_rate_fn: String,
    cadence: EmissionCadence,
    has_multiplier: bool,
    alloc_point_index: usize,
    reward_oracle: OracleNamespace,
    reward_oracle_id: String,
    reward_decimals: u32,
    lp_fee: Decimal,
    with_breakdowns: bool,
    policy: CompoundingPolicy,
    pools: Vec<Pool>,
    reader: Arc<dyn BatchedChainReader>,
    oracle: Arc<dyn PriceOracle>,
    trading_fees: Arc<dyn TradingFeeSource>,
}

impl MasterChefFetcher {
    pub fn new(
        params: MasterChefParams,
        default_performance_fee: Decimal,
        reader: Arc<dyn BatchedChainReader>,
        oracle: Arc<dyn PriceOracle>,
        trading_fees: Arc<dyn TradingFeeSource>,
    ) -> ApyResult<Self> {
        if reader.network() != params.network {
            return Err(ApyError::Configuration(format!(
                "{}: reader is for {}, source is on {}",
                params.id, reader.network(), params.network
            )));
        }

        let retention = retention_for(
            &params.id,
            params.performance_fee.unwrap_or(default_performance_fee),
        )?;
        check_decimals(&params.id, &params.reward_oracle_id, params.reward_decimals)?;
        let network = params.network;
        let chef = params.chef;
        let pools: Vec<Pool> = params.pools.into_iter().map(|p| p.into_pool(network, chef)).collect();
        check_pool_decimals(&params.id, &pools)?;

        Ok(Self {
            pools,
            id: params.id,
            chef,
            reward_rate_fn: params.reward_rate_fn,
            cadence: params.cadence,
            has_multiplier: params.has_multiplier,
            alloc_point_index: params.alloc_point_index,
            reward_oracle: params.reward_oracle,
            reward_oracle_id: params.reward_oracle_id,
            reward_decimals: params.reward_decimals,
            lp_fee: params.lp_fee,
            with_breakdowns: params.with_breakdowns,
            policy: CompoundingPolicy {
                periods_per_year: params.compoundings_per_year,
                retention,
            },
            reader,
            oracle,
            trading_fees,
        })
    }

    /// Reward rate, total allocation and, with a multiplier schedule, the
    /// current block in one batch
    async fn read_chef_state(&self) -> ApyResult<(Decimal, U256, Option<U256>)> {
        let mut calls = vec![
            ReadCall::new(self.chef, getter_call(&self.reward_rate_fn)),
            ReadCall::new(self.chef, IMasterChef::totalAllocPointCall {}.abi_encode()),
        ];
        if self.has_multiplier {
            calls.push(ReadCall::block_number());
        }

        let results = self.reader.batch_read(&calls).await?;

        let emission = required_word(&results, 0, 0, self.chef, &self.reward_rate_fn)?;
        let total_alloc_point = required_word(&results, 1, 0, self.chef, "totalAllocPoint")?;
        let block = if self.has_multiplier {
            Some(required_word(&results, 2, 0, calls[2].target, "getBlockNumber")?)
        } else {
            None
        };

        Ok((
            required_decimal(emission, self.chef, &self.reward_rate_fn)?,
            total_alloc_point,
            block,
        ))
    }

    /// Multiplier for the last block plus every pool's balance and weight
    async fn read_pools(
        &self,
        block: Option<U256>,
    ) -> ApyResult<(Option<Decimal>, Vec<Option<(U256, U256)>>)> {
        let mut calls = Vec::with_capacity(1 + self.pools.len() * 2);
        if let Some(block) = block {
            calls.push(ReadCall::new(
                self.chef,
                IMasterChef::getMultiplierCall {
                    from: block.saturating_sub(U256::from(1)),
                    to: block,
                }
                .abi_encode(),
            ));
        }
        for pool in &self.pools {
            calls.extend(staking_calls(self.chef, pool));
        }

        let results = self.reader.batch_read(&calls).await?;

        let offset = usize::from(block.is_some());
        let multiplier = if block.is_some() {
            let raw = required_word(&results, 0, 0, self.chef, "getMultiplier")?;
            Some(required_decimal(raw, self.chef, "getMultiplier")?)
        } else {
            None
        };

        let per_pool = results
            .get(offset..)
            .unwrap_or_default()
            .chunks(2)
            .map(|pair| match pair {
                [balance, info] => Some((balance.word(0)?, info.word(self.alloc_point_index)?)),
                _ => None,
            })
            .collect::<Vec<_>>();

        Ok((multiplier, per_pool))
    }

    fn pool_yield(
        &self,
        pool: &Pool,
        snapshot: &AllocationSnapshot,
        state: &ChefState,
        reward_price: Decimal,
        staked_price: Decimal,
        trading_apr: Decimal,
    ) -> Option<YieldResult> {
        let staked = staked_usd(snapshot.staked_balance, pool.token_decimals(), staked_price)?;
        let share = allocation_share(snapshot.alloc_point, snapshot.total_alloc_point)?;

        let flow = RewardFlow {
            token: self.reward_oracle_id.clone(),
            usd_per_year: annualize(
                state.emission,
                share,
                self.cadence.unit_seconds(),
                reward_price,
                self.reward_decimals,
                state.multiplier,
            )?,
        };

        let simple = simple_apr(yearly_reward(&[flow])?, staked)?;
        compose_yield(simple, trading_apr, self.lp_fee, self.policy, self.with_breakdowns)
    }
}

#[async_trait]
impl ProtocolFetcher for MasterChefFetcher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> ApyResult<SourceYields> {
        let (emission, total_alloc_point, block) = self.read_chef_state().await?;
        let (multiplier, pool_reads) = self.read_pools(block).await?;
        let state = ChefState { emission, total_alloc_point, multiplier };

        let pairs: Vec<Address> = self.pools.iter().map(|p| p.address).collect();
        let (reward_price, staked_prices, trading_aprs) = tokio::join!(
            self.oracle.price(self.reward_oracle, &self.reward_oracle_id),
            staked_token_prices(self.oracle.as_ref(), &self.pools),
            self.trading_fees.trading_aprs(&pairs),
        );
        let staked_prices = staked_prices?;
        let trading_aprs = trading_aprs?;

        let Some(reward_price) = optional_price(reward_price)? else {
            info!("{}: no price for {}, every pool omitted", self.id, self.reward_oracle_id);
            return Ok(SourceYields::from_results(Vec::new(), self.with_breakdowns));
        };

        let mut results = Vec::with_capacity(self.pools.len());
        for (i, pool) in self.pools.iter().enumerate() {
            let snapshot = pool_reads.get(i).copied().flatten().map(|(balance, alloc)| AllocationSnapshot {
                staked_balance: balance,
                alloc_point: alloc,
                total_alloc_point: state.total_alloc_point,
                bonus_alloc_point: None,
            });
            let staked_price = staked_prices.get(i).copied().flatten();
            let trading_apr = trading_aprs.get(&pool.address).copied().unwrap_or_default();

            let result = match (snapshot, staked_price) {
                (Some(snapshot), Some(price)) => {
                    self.pool_yield(pool, &snapshot, &state, reward_price, price, trading_apr)
                }
                _ => None,
            };

            match result {
                Some(result) => results.push((pool.name.clone(), result)),
                None => debug!(source = %self.id, pool = %pool.name, "Yield undefined this run, pool omitted"),
            }
        }

        debug!(
            source = %self.id,
            pools = self.pools.len(),
            computed = results.len(),
            "MasterChef fetch complete"
        );

        Ok(SourceYields::from_results(results, self.with_breakdowns))
    }
}
