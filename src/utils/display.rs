//! Display and printing utilities

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use crate::types::AggregationOutcome;

fn as_percent(value: Decimal) -> Decimal {
    (value * dec!(100)).round_dp(2)
}

pub fn print_outcome_summary(outcome: &AggregationOutcome) {
    info!("\n📊 Aggregation run {} ({}ms)", outcome.run_id, outcome.elapsed_ms);
    info!("   Sources succeeded: {}", outcome.succeeded.len());
    info!("   Sources failed: {}", outcome.failures.len());
    info!("   Pools with APY: {}", outcome.pools.len());

    if let Some((name, best)) = outcome.pools.iter().max_by_key(|(_, apy)| apy.total_apy) {
        info!("   🏆 Highest APY: {} at {}%", name, as_percent(best.total_apy));
    }

    for (name, apy) in &outcome.pools {
        match &apy.breakdown {
            Some(breakdown) => info!(
                "   💹 {} | APY: {}% | Vault APR: {}% | Trading APR: {}% | HPY: {}",
                name,
                as_percent(apy.total_apy),
                as_percent(breakdown.vault_apr),
                as_percent(breakdown.trading_apr),
                breakdown.compoundings_per_year
            ),
            None => info!("   💹 {} | APY: {}%", name, as_percent(apy.total_apy)),
        }
    }

    for failure in &outcome.failures {
        warn!("   ❌ {}: {}", failure.source, failure.reason);
    }

    info!("");
}
