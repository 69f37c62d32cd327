//! Yield results, per-source result shapes and the aggregation outcome

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// One annualized USD reward stream for a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardFlow {
    pub token: String,
    pub usd_per_year: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApyBreakdown {
    pub vault_apr: Decimal,
    pub compoundings_per_year: u64,
    pub performance_fee: Decimal,
    pub vault_apy: Decimal,
    pub lp_fee: Decimal,
    pub trading_apr: Decimal,
    pub total_apy: Decimal,
}

/// Computed yield for one pool. Only built when every input is defined, so
/// the values are always finite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldResult {
    pub simple_apr: Decimal,
    pub apy: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ApyBreakdown>,
}

/// What a fetcher hands back: either plain APYs, or APYs together with
/// their component breakdowns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceYields {
    Apys(BTreeMap<String, Decimal>),
    WithBreakdowns {
        apys: BTreeMap<String, Decimal>,
        breakdowns: BTreeMap<String, ApyBreakdown>,
    },
}

impl SourceYields {
    pub fn from_results(results: Vec<(String, YieldResult)>, with_breakdowns: bool) -> Self {
        let mut apys = BTreeMap::new();
        let mut breakdowns = BTreeMap::new();

        for (name, result) in results {
            apys.insert(name.clone(), result.apy);
            if let Some(breakdown) = result.breakdown {
                breakdowns.insert(name, breakdown);
            }
        }

        if with_breakdowns {
            SourceYields::WithBreakdowns { apys, breakdowns }
        } else {
            SourceYields::Apys(apys)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceYields::Apys(apys) => apys.len(),
            SourceYields::WithBreakdowns { apys, .. } => apys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into the unified per-pool shape
    pub fn into_pool_apys(self) -> Vec<(String, PoolApy)> {
        match self {
            SourceYields::Apys(apys) => apys
                .into_iter()
                .map(|(name, total_apy)| (name, PoolApy { total_apy, breakdown: None }))
                .collect(),
            SourceYields::WithBreakdowns { apys, mut breakdowns } => apys
                .into_iter()
                .map(|(name, total_apy)| {
                    let breakdown = breakdowns.remove(&name);
                    (name, PoolApy { total_apy, breakdown })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolApy {
    pub total_apy: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ApyBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Result of one aggregation run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOutcome {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub pools: BTreeMap<String, PoolApy>,
    pub succeeded: Vec<String>,
    pub failures: Vec<SourceFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn breakdown(total: Decimal) -> ApyBreakdown {
        ApyBreakdown {
            vault_apr: dec!(0.0477),
            compoundings_per_year: 2190,
            performance_fee: dec!(0.045),
            vault_apy: dec!(0.0488),
            lp_fee: dec!(0.0025),
            trading_apr: dec!(0.01),
            total_apy: total,
        }
    }

    #[test]
    fn test_from_results_keeps_breakdowns_when_requested() {
        let results = vec![(
            "sushi-usdc-weth".to_string(),
            YieldResult {
                simple_apr: dec!(0.05),
                apy: dec!(0.06),
                breakdown: Some(breakdown(dec!(0.06))),
            },
        )];

        let flat = SourceYields::from_results(results.clone(), false);
        assert!(matches!(flat, SourceYields::Apys(ref apys) if apys.len() == 1));

        let detailed = SourceYields::from_results(results, true);
        match detailed {
            SourceYields::WithBreakdowns { apys, breakdowns } => {
                assert_eq!(apys["sushi-usdc-weth"], dec!(0.06));
                assert_eq!(breakdowns["sushi-usdc-weth"].total_apy, dec!(0.06));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn test_into_pool_apys_normalizes_both_shapes() {
        let mut apys = BTreeMap::new();
        apys.insert("a".to_string(), dec!(0.1));
        apys.insert("b".to_string(), dec!(0.2));
        let mut breakdowns = BTreeMap::new();
        breakdowns.insert("a".to_string(), breakdown(dec!(0.1)));

        let pools = SourceYields::WithBreakdowns { apys: apys.clone(), breakdowns }.into_pool_apys();
        assert_eq!(pools.len(), 2);
        assert!(pools[0].1.breakdown.is_some());
        assert!(pools[1].1.breakdown.is_none());

        let flat = SourceYields::Apys(apys).into_pool_apys();
        assert!(flat.iter().all(|(_, p)| p.breakdown.is_none()));
    }

    #[test]
    fn test_pool_apy_serializes_camel_case() {
        let apy = PoolApy { total_apy: dec!(0.05), breakdown: Some(breakdown(dec!(0.05))) };
        let json = serde_json::to_value(&apy).unwrap();
        assert!(json.get("totalApy").is_some());
        assert!(json["breakdown"].get("compoundingsPerYear").is_some());

        let bare = PoolApy { total_apy: dec!(0.05), breakdown: None };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("breakdown").is_none());
    }
}
