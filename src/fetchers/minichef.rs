//! MiniChef family: a primary emission plus a bonus rewarder per pool

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
    abi::{getter_call, IMasterChef, IRewarder},
    check_decimals, check_pool_decimals, required_decimal, required_word, retention_for,
    staked_token_prices, staked_usd, staking_calls,
    ProtocolFetcher, TradingFeeSource,
};
use crate::{
    config::BASE_HPY,
    errors::{ApyError, ApyResult},
    network::{BatchedChainReader, ReadCall},
    oracle::{optional_price, PriceOracle},
    types::{AllocationSnapshot, Network, OracleNamespace, Pool, PoolEntry, RewardFlow, SourceYields, YieldResult},
    yields::{allocation_share, annualize, compose_yield, simple_apr, yearly_reward, CompoundingPolicy},
};

fn default_reward_rate_fn() -> String {
    "sushiPerSecond".to_string()
}

fn default_tokens() -> OracleNamespace {
    OracleNamespace::Tokens
}

fn default_decimals() -> u32 {
    18
}

fn default_alloc_point_index() -> usize {
    2
}

// The rewarder keeps its total allocation private; front-ends assume 1000
fn default_rewarder_total_alloc_point() -> u64 {
    1000
}

fn default_minichef_hpy() -> u64 {
    BASE_HPY
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniChefParams {
    pub id: String,
    pub network: Network,
    pub chef: Address,
    #[serde(default = "default_reward_rate_fn")]
    pub reward_rate_fn: String,
    #[serde(default = "default_tokens")]
    pub reward_oracle: OracleNamespace,
    pub reward_oracle_id: String,
    #[serde(default = "default_decimals")]
    pub reward_decimals: u32,
    pub rewarder: Address,
    #[serde(default = "default_tokens")]
    pub bonus_oracle: OracleNamespace,
    pub bonus_oracle_id: String,
    #[serde(default = "default_decimals")]
    pub bonus_decimals: u32,
    #[serde(default = "default_rewarder_total_alloc_point")]
    pub rewarder_total_alloc_point: u64,
    /// Word of both `poolInfo` tuples holding the allocation weight
    #[serde(default = "default_alloc_point_index")]
    pub alloc_point_index: usize,
    #[serde(default = "default_minichef_hpy")]
    pub compoundings_per_year: u64,
    #[serde(default)]
    pub lp_fee: Decimal,
    #[serde(default)]
    pub performance_fee: Option<Decimal>,
    #[serde(default)]
    pub trading_aprs: HashMap<Address, Decimal>,
    pub pools: Vec<PoolEntry>,
}

/// Per-second emissions of both streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Emissions {
    primary: Decimal,
    bonus: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RewardPrices {
    primary: Decimal,
    bonus: Decimal,
}

pub struct MiniChefFetcher {
    id: String,
    chef: Address,
    rewarder: Address,
    reward_rate_fn: String,
    reward_oracle: OracleNamespace,
    reward_oracle_id: String,
    reward_decimals: u32,
    bonus_oracle: OracleNamespace,
    bonus_oracle_id: String,
    bonus_decimals: u32,
    rewarder_total_alloc_point: U256,
    alloc_point_index: usize,
    lp_fee: Decimal,
    policy: CompoundingPolicy,
    pools: Vec<Pool>,
    reader: Arc<dyn BatchedChainReader>,
    oracle: Arc<dyn PriceOracle>,
    trading_fees: Arc<dyn TradingFeeSource>,
}

impl MiniChefFetcher {
    pub fn new(
        params: MiniChefParams,
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
        if params.rewarder_total_alloc_point == 0 {
            return Err(ApyError::Configuration(format!(
                "{}: rewarder total allocation must be positive",
                params.id
            )));
        }

        let retention = retention_for(
            &params.id,
            params.performance_fee.unwrap_or(default_performance_fee),
        )?;
        check_decimals(&params.id, &params.reward_oracle_id, params.reward_decimals)?;
        check_decimals(&params.id, &params.bonus_oracle_id, params.bonus_decimals)?;
        let network = params.network;
        let chef = params.chef;
        let pools: Vec<Pool> = params.pools.into_iter().map(|p| p.into_pool(network, chef)).collect();
        check_pool_decimals(&params.id, &pools)?;

        Ok(Self {
            pools,
            id: params.id,
            chef,
            rewarder: params.rewarder,
            reward_rate_fn: params.reward_rate_fn,
            reward_oracle: params.reward_oracle,
            reward_oracle_id: params.reward_oracle_id,
            reward_decimals: params.reward_decimals,
            bonus_oracle: params.bonus_oracle,
            bonus_oracle_id: params.bonus_oracle_id,
            bonus_decimals: params.bonus_decimals,
            rewarder_total_alloc_point: U256::from(params.rewarder_total_alloc_point),
            alloc_point_index: params.alloc_point_index,
            lp_fee: params.lp_fee,
            policy: CompoundingPolicy {
                periods_per_year: params.compoundings_per_year,
                retention,
            },
            reader,
            oracle,
            trading_fees,
        })
    }

    async fn read_emissions(&self) -> ApyResult<(Emissions, U256)> {
        let calls = [
            ReadCall::new(self.chef, getter_call(&self.reward_rate_fn)),
            ReadCall::new(self.chef, IMasterChef::totalAllocPointCall {}.abi_encode()),
            ReadCall::new(self.rewarder, IRewarder::rewardPerSecondCall {}.abi_encode()),
        ];

        let results = self.reader.batch_read(&calls).await?;

        let primary = required_word(&results, 0, 0, self.chef, &self.reward_rate_fn)?;
        let total_alloc_point = required_word(&results, 1, 0, self.chef, "totalAllocPoint")?;
        let bonus = required_word(&results, 2, 0, self.rewarder, "rewardPerSecond")?;

        let emissions = Emissions {
            primary: required_decimal(primary, self.chef, &self.reward_rate_fn)?,
            bonus: required_decimal(bonus, self.rewarder, "rewardPerSecond")?,
        };
        Ok((emissions, total_alloc_point))
    }

    /// Balance, chef weight and rewarder weight of every pool in one batch.
    /// A reverted rewarder read means the pool has no bonus stream.
    async fn read_snapshots(&self, total_alloc_point: U256) -> ApyResult<Vec<Option<AllocationSnapshot>>> {
        let mut calls = Vec::with_capacity(self.pools.len() * 3);
        for pool in &self.pools {
            calls.extend(staking_calls(self.chef, pool));
            calls.push(ReadCall::new(
                self.rewarder,
                IRewarder::poolInfoCall { pid: U256::from(pool.pool_id) }.abi_encode(),
            ));
        }

        let results = self.reader.batch_read(&calls).await?;

        Ok(results
            .chunks(3)
            .map(|reads| match reads {
                [balance, info, bonus_info] => Some(AllocationSnapshot {
                    staked_balance: balance.word(0)?,
                    alloc_point: info.word(self.alloc_point_index)?,
                    total_alloc_point,
                    bonus_alloc_point: bonus_info.word(self.alloc_point_index),
                }),
                _ => None,
            })
            .collect())
    }

    fn reward_flows(
        &self,
        snapshot: &AllocationSnapshot,
        emissions: Emissions,
        prices: RewardPrices,
    ) -> Option<Vec<RewardFlow>> {
        let share = allocation_share(snapshot.alloc_point, snapshot.total_alloc_point)?;
        let mut flows = vec![RewardFlow {
            token: self.reward_oracle_id.clone(),
            usd_per_year: annualize(
                emissions.primary,
                share,
                Decimal::ONE,
                prices.primary,
                self.reward_decimals,
                None,
            )?,
        }];

        if let Some(bonus_alloc_point) = snapshot.bonus_alloc_point {
            let bonus_share = allocation_share(bonus_alloc_point, self.rewarder_total_alloc_point)?;
            flows.push(RewardFlow {
                token: self.bonus_oracle_id.clone(),
                usd_per_year: annualize(
                    emissions.bonus,
                    bonus_share,
                    Decimal::ONE,
                    prices.bonus,
                    self.bonus_decimals,
                    None,
                )?,
            });
        }

        Some(flows)
    }

    fn pool_yield(
        &self,
        pool: &Pool,
        snapshot: &AllocationSnapshot,
        emissions: Emissions,
        prices: RewardPrices,
        staked_price: Decimal,
        trading_apr: Decimal,
    ) -> Option<YieldResult> {
        let staked = staked_usd(snapshot.staked_balance, pool.token_decimals(), staked_price)?;
        let flows = self.reward_flows(snapshot, emissions, prices)?;
        let simple = simple_apr(yearly_reward(&flows)?, staked)?;
        compose_yield(simple, trading_apr, self.lp_fee, self.policy, true)
    }
}

#[async_trait]
impl ProtocolFetcher for MiniChefFetcher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> ApyResult<SourceYields> {
        let (emissions, total_alloc_point) = self.read_emissions().await?;
        let snapshots = self.read_snapshots(total_alloc_point).await?;

        let pairs: Vec<Address> = self.pools.iter().map(|p| p.address).collect();
        let (primary_price, bonus_price, staked_prices, trading_aprs) = tokio::join!(
            self.oracle.price(self.reward_oracle, &self.reward_oracle_id),
            self.oracle.price(self.bonus_oracle, &self.bonus_oracle_id),
            staked_token_prices(self.oracle.as_ref(), &self.pools),
            self.trading_fees.trading_aprs(&pairs),
        );
        let staked_prices = staked_prices?;
        let trading_aprs = trading_aprs?;

        let prices = match (optional_price(primary_price)?, optional_price(bonus_price)?) {
            (Some(primary), Some(bonus)) => RewardPrices { primary, bonus },
            _ => {
                info!(
                    "{}: missing price for {} or {}, every pool omitted",
                    self.id, self.reward_oracle_id, self.bonus_oracle_id
                );
                return Ok(SourceYields::from_results(Vec::new(), true));
            }
        };

        let mut results = Vec::with_capacity(self.pools.len());
        for (i, pool) in self.pools.iter().enumerate() {
            let snapshot = snapshots.get(i).cloned().flatten();
            let staked_price = staked_prices.get(i).copied().flatten();
            let trading_apr = trading_aprs.get(&pool.address).copied().unwrap_or_default();

            let result = match (snapshot, staked_price) {
                (Some(snapshot), Some(price)) => {
                    self.pool_yield(pool, &snapshot, emissions, prices, price, trading_apr)
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
            "MiniChef fetch complete"
        );

        Ok(SourceYields::from_results(results, true))
    }
}
