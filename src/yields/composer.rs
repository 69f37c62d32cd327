//! APR/APY composition
//!
//! Every function returns `None` instead of an infinite or overflowed value;
//! callers omit the affected pool.

use rust_decimal::{Decimal, MathematicalOps};
use crate::types::{ApyBreakdown, RewardFlow, YieldResult};

/// Sum of the annualized USD flows of every reward stream of a pool
pub fn yearly_reward(flows: &[RewardFlow]) -> Option<Decimal> {
    flows
        .iter()
        .try_fold(Decimal::ZERO, |acc, flow| acc.checked_add(flow.usd_per_year))
}

pub fn simple_apr(yearly_usd: Decimal, staked_usd: Decimal) -> Option<Decimal> {
    if staked_usd <= Decimal::ZERO {
        return None;
    }
    yearly_usd.checked_div(staked_usd)
}

/// `(1 + apr * retention / periods)^(periods * years) - 1`
pub fn compound(apr: Decimal, periods: u64, years: u64, retention: Decimal) -> Option<Decimal> {
    if periods == 0 {
        return None;
    }

    let per_period = apr
        .checked_mul(retention)?
        .checked_div(Decimal::from(periods))?;
    let exponent = periods.checked_mul(years)?;

    Decimal::ONE
        .checked_add(per_period)?
        .checked_powu(exponent)?
        .checked_sub(Decimal::ONE)
}

/// Compounding policy of one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundingPolicy {
    pub periods_per_year: u64,
    pub retention: Decimal,
}

impl CompoundingPolicy {
    pub fn performance_fee(&self) -> Decimal {
        Decimal::ONE - self.retention
    }
}

/// Rewards and trading fees compound together: the total is
/// `compound(simple + trading)`, not the sum of two compounded values.
pub fn compose_yield(
    simple: Decimal,
    trading_apr: Decimal,
    lp_fee: Decimal,
    policy: CompoundingPolicy,
    with_breakdown: bool,
) -> Option<YieldResult> {
    let periods = policy.periods_per_year;
    let retention = policy.retention;

    let total_apy = compound(simple.checked_add(trading_apr)?, periods, 1, retention)?;

    let breakdown = if with_breakdown {
        Some(ApyBreakdown {
            vault_apr: simple.checked_mul(retention)?,
            compoundings_per_year: periods,
            performance_fee: policy.performance_fee(),
            vault_apy: compound(simple, periods, 1, retention)?,
            lp_fee,
            trading_apr,
            total_apy,
        })
    } else {
        None
    };

    Some(YieldResult {
        simple_apr: simple,
        apy: total_apy,
        breakdown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BASE_HPY, HOURLY_HPY};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn policy(periods: u64) -> CompoundingPolicy {
        CompoundingPolicy { periods_per_year: periods, retention: dec!(0.955) }
    }

    #[test]
    fn test_simple_apr_undefined_without_stake() {
        assert_eq!(simple_apr(dec!(50_000), dec!(1_000_000)), Some(dec!(0.05)));
        assert_eq!(simple_apr(dec!(50_000), dec!(0)), None);
        assert_eq!(simple_apr(dec!(50_000), dec!(-1)), None);
    }

    #[test]
    fn test_hourly_compounding_scenario() {
        let reward_only = compound(dec!(0.05), HOURLY_HPY, 1, dec!(0.955)).unwrap();
        assert!(reward_only > dec!(0.0488) && reward_only < dec!(0.0491), "{}", reward_only);

        let with_fees = compose_yield(dec!(0.05), dec!(0.01), dec!(0.0025), policy(HOURLY_HPY), false).unwrap();
        assert!(with_fees.apy > reward_only);
        assert!(with_fees.apy > dec!(0.058) && with_fees.apy < dec!(0.0595), "{}", with_fees.apy);
        assert!(with_fees.breakdown.is_none());
    }

    #[test]
    fn test_streams_are_summed_before_compounding() {
        let flows = vec![
            RewardFlow { token: "SUSHI".to_string(), usd_per_year: dec!(50_000) },
            RewardFlow { token: "WMATIC".to_string(), usd_per_year: dec!(5_000) },
        ];
        let yearly = yearly_reward(&flows).unwrap();
        let apr = simple_apr(yearly, dec!(1_000_000)).unwrap();
        assert_eq!(apr, dec!(0.055));

        let combined = compound(apr, BASE_HPY, 1, dec!(0.955)).unwrap();
        let separate = compound(dec!(0.05), BASE_HPY, 1, dec!(0.955)).unwrap()
            + compound(dec!(0.005), BASE_HPY, 1, dec!(0.955)).unwrap();
        assert!(combined > separate);
    }

    #[test]
    fn test_breakdown_components() {
        let result = compose_yield(dec!(0.1), dec!(0.02), dec!(0.003), policy(BASE_HPY), true).unwrap();
        let breakdown = result.breakdown.unwrap();

        assert_eq!(breakdown.vault_apr, dec!(0.0955));
        assert_eq!(breakdown.performance_fee, dec!(0.045));
        assert_eq!(breakdown.compoundings_per_year, BASE_HPY);
        assert_eq!(breakdown.vault_apy, compound(dec!(0.1), BASE_HPY, 1, dec!(0.955)).unwrap());
        assert_eq!(breakdown.total_apy, result.apy);
        assert_eq!(breakdown.lp_fee, dec!(0.003));
        assert_eq!(breakdown.trading_apr, dec!(0.02));
        assert!(breakdown.total_apy > breakdown.vault_apy);
    }

    #[test]
    fn test_zero_periods_is_undefined() {
        assert_eq!(compound(dec!(0.1), 0, 1, dec!(1)), None);
    }

    proptest! {
        #[test]
        fn compounding_never_below_simple_retained(
            apr_bps in 0u64..=50_000,
            fee_bps in 1u64..=10_000,
            periods in 1u64..=8760,
        ) {
            let apr = Decimal::new(apr_bps as i64, 4);
            let retention = Decimal::new(fee_bps as i64, 4);
            let apy = compound(apr, periods, 1, retention).unwrap();
            // allow for rounding in the last places of the power
            prop_assert!(apy >= apr * retention - dec!(0.0000000001));
        }

        #[test]
        fn compounding_is_monotone_in_periods(
            apr_bps in 1u64..=50_000,
            fee_bps in 1u64..=10_000,
            periods in 1u64..=8760,
            extra in 1u64..1000,
        ) {
            let apr = Decimal::new(apr_bps as i64, 4);
            let retention = Decimal::new(fee_bps as i64, 4);
            let fewer = compound(apr, periods, 1, retention).unwrap();
            let more = compound(apr, periods + extra, 1, retention).unwrap();
            prop_assert!(more >= fewer - dec!(0.0000000001));
        }

        #[test]
        fn no_reward_no_yield(periods in 1u64..=525_600, fee_bps in 1u64..=10_000) {
            let retention = Decimal::new(fee_bps as i64, 4);
            prop_assert_eq!(compound(Decimal::ZERO, periods, 1, retention), Some(Decimal::ZERO));
        }
    }
}
