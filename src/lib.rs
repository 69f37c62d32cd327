//! Farm APY - multi-chain yield farm APY aggregator
//!
//! Reads staking-contract state through batched Multicall3 calls, prices
//! rewards and staked LP tokens through an HTTP oracle, and compounds the
//! result into one comparable APY per pool. Every source runs concurrently;
//! a failing source is reported without holding back the others.

pub mod config;
pub mod types;
pub mod errors;
pub mod network;
pub mod oracle;
pub mod yields;
pub mod fetchers;
pub mod aggregator;
pub mod registry;
pub mod utils;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{ApyError, ApyResult};
pub use types::*;

// Type alias for our concrete provider
pub type ConcreteProvider = alloy::providers::RootProvider<alloy::transports::BoxTransport>;
