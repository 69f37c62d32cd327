//! Engine configuration settings and environment variable handling

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;
use crate::types::Network;

// Fixed year length used for every annualization
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

// Compounding frequencies (harvests per year)
pub const BASE_HPY: u64 = 2190;
pub const HOURLY_HPY: u64 = 8760;
pub const MINUTELY_HPY: u64 = 525_600;

pub const DEFAULT_PERFORMANCE_FEE: Decimal = dec!(0.045);
pub const MAX_PERFORMANCE_FEE: Decimal = dec!(0.5);

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PRICE_CACHE_SECS: u64 = 60;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub polygon_rpc_url: String,
    pub bsc_rpc_url: String,
    pub fantom_rpc_url: String,
    pub price_api_url: String,
    pub sources_file: String,
    pub request_timeout_secs: u64,
    pub price_cache_secs: u64,
    pub performance_fee: Decimal,
    pub refresh_interval_secs: u64,
    pub run_once: bool,
    pub print_json: bool,
    pub log_dir: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            polygon_rpc_url: env::var("POLYGON_RPC_URL")
                .unwrap_or_else(|_| "https://polygon-rpc.com".to_string()),
            bsc_rpc_url: env::var("BSC_RPC_URL")
                .unwrap_or_else(|_| "https://bsc-dataseed.binance.org".to_string()),
            fantom_rpc_url: env::var("FANTOM_RPC_URL")
                .unwrap_or_else(|_| "https://rpc.ftm.tools".to_string()),
            price_api_url: env::var("PRICE_API_URL")
                .unwrap_or_else(|_| "https://api.beefy.finance".to_string())
                .trim_end_matches('/')
                .to_string(),
            sources_file: env::var("SOURCES_FILE")
                .unwrap_or_else(|_| "data/sources.json".to_string()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
                .max(1),
            price_cache_secs: env::var("PRICE_CACHE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PRICE_CACHE_SECS),
            performance_fee: env::var("PERFORMANCE_FEE")
                .ok()
                .and_then(|s| Decimal::from_str(&s).ok())
                .unwrap_or(DEFAULT_PERFORMANCE_FEE)
                .max(dec!(0))
                .min(MAX_PERFORMANCE_FEE),
            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
                .max(MIN_REFRESH_INTERVAL_SECS),
            run_once: env::var("RUN_ONCE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            print_json: env::var("PRINT_JSON")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            log_dir: env::var("LOG_DIR")
                .unwrap_or_else(|_| "output/logs".to_string()),
        }
    }

    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::Polygon => &self.polygon_rpc_url,
            Network::Bsc => &self.bsc_rpc_url,
            Network::Fantom => &self.fantom_rpc_url,
        }
    }

    /// Share of gross yield kept by depositors after the performance fee
    pub fn retention_factor(&self) -> Decimal {
        dec!(1) - self.performance_fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_factor() {
        let mut config = Config::load();
        config.performance_fee = dec!(0.045);
        assert_eq!(config.retention_factor(), dec!(0.955));
    }

    #[test]
    fn test_rpc_url_per_network() {
        let mut config = Config::load();
        config.bsc_rpc_url = "http://bsc.local".to_string();
        assert_eq!(config.rpc_url(Network::Bsc), "http://bsc.local");
    }

    #[test]
    fn test_year_length() {
        assert_eq!(SECONDS_PER_YEAR, 365 * 86_400);
    }
}
