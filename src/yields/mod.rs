//! Yield math: reward normalization and APR/APY composition

pub mod composer;
pub mod normalizer;

pub use composer::*;
pub use normalizer::*;
