//! Error types shared by readers, oracle, fetchers and the aggregator

pub mod apy_error;

pub use apy_error::*;
