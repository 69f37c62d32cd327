//! Reward rate normalization: raw emission schedules to USD per year

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::{
    config::SECONDS_PER_YEAR,
    utils::{pow10, u256_to_decimal},
};

/// How a staking contract expresses its emission rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EmissionCadence {
    PerBlock {
        #[serde(rename = "secondsPerBlock")]
        seconds_per_block: Decimal,
    },
    PerSecond,
}

impl EmissionCadence {
    pub fn unit_seconds(&self) -> Decimal {
        match self {
            EmissionCadence::PerBlock { seconds_per_block } => *seconds_per_block,
            EmissionCadence::PerSecond => Decimal::ONE,
        }
    }
}

/// `weight / total` as an exact decimal. `None` for a zero total or when
/// either side does not fit a decimal.
pub fn allocation_share(weight: U256, total: U256) -> Option<Decimal> {
    if total.is_zero() {
        return None;
    }
    u256_to_decimal(weight)?.checked_div(u256_to_decimal(total)?)
}

/// Annualized USD reward flow for one pool.
///
/// `emission` is the raw reward amount per unit of time (per block or per
/// second) in the reward token's smallest unit. The token-decimal scaling is
/// applied before the year and price factors so large raw emissions stay
/// inside the decimal range. Returns `None` if any step overflows or the
/// unit time is not positive.
pub fn annualize(
    emission: Decimal,
    share: Decimal,
    unit_seconds: Decimal,
    price_usd: Decimal,
    decimals: u32,
    multiplier: Option<Decimal>,
) -> Option<Decimal> {
    if unit_seconds <= Decimal::ZERO {
        return None;
    }

    let per_unit = emission
        .checked_mul(multiplier.unwrap_or(Decimal::ONE))?
        .checked_mul(share)?
        .checked_div(pow10(decimals)?)?;

    per_unit
        .checked_div(unit_seconds)?
        .checked_mul(Decimal::from(SECONDS_PER_YEAR))?
        .checked_mul(price_usd)
}
