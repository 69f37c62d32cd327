//! Concurrent aggregation over every registered source

pub mod engine;

pub use engine::*;
