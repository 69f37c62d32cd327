#![allow(dead_code)]

use alloy::primitives::{Bytes, U256};
use async_trait::async_trait;
use farm_apy::{
    errors::{ApyError, ApyResult},
    fetchers::ProtocolFetcher,
    network::{BatchedChainReader, RawResult, ReadCall},
    oracle::PriceOracle,
    types::{Network, OracleNamespace, SourceYields},
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn words(values: &[U256]) -> Bytes {
    let mut out = Vec::with_capacity(values.len() * 32);
    for value in values {
        out.extend_from_slice(&value.to_be_bytes::<32>());
    }
    out.into()
}

pub fn wei(tokens: u64) -> U256 {
    U256::from(tokens) * U256::from(10u64).pow(U256::from(18u64))
}

/// Scripted batched reader. Calls without a scripted answer revert.
pub struct FakeReader {
    network: Network,
    responses: HashMap<ReadCall, RawResult>,
    round_trips: AtomicUsize,
    calls_seen: AtomicUsize,
}

impl FakeReader {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            responses: HashMap::new(),
            round_trips: AtomicUsize::new(0),
            calls_seen: AtomicUsize::new(0),
        }
    }

    pub fn respond(mut self, call: ReadCall, values: &[U256]) -> Self {
        self.responses.insert(call, RawResult::Success(words(values)));
        self
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    pub fn calls_seen(&self) -> usize {
        self.calls_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchedChainReader for FakeReader {
    fn network(&self) -> Network {
        self.network
    }

    async fn batch_read(&self, calls: &[ReadCall]) -> ApyResult<Vec<RawResult>> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.calls_seen.fetch_add(calls.len(), Ordering::SeqCst);
        Ok(calls
            .iter()
            .map(|call| self.responses.get(call).cloned().unwrap_or(RawResult::Failure))
            .collect())
    }
}

/// Reader whose transport is down
pub struct DownReader(pub Network);

#[async_trait]
impl BatchedChainReader for DownReader {
    fn network(&self) -> Network {
        self.0
    }

    async fn batch_read(&self, _calls: &[ReadCall]) -> ApyResult<Vec<RawResult>> {
        Err(ApyError::Network {
            message: format!("{} RPC unreachable", self.0),
            source: None,
        })
    }
}

#[derive(Default)]
pub struct FakeOracle {
    prices: HashMap<(OracleNamespace, String), Decimal>,
    failing: bool,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { prices: HashMap::new(), failing: true }
    }

    pub fn with_price(mut self, namespace: OracleNamespace, id: &str, price: Decimal) -> Self {
        self.prices.insert((namespace, id.to_string()), price);
        self
    }
}

#[async_trait]
impl PriceOracle for FakeOracle {
    async fn price(&self, namespace: OracleNamespace, id: &str) -> ApyResult<Decimal> {
        if self.failing {
            return Err(ApyError::Oracle { message: "HTTP 503".to_string() });
        }
        self.prices
            .get(&(namespace, id.to_string()))
            .copied()
            .ok_or_else(|| ApyError::PriceUnavailable { namespace, id: id.to_string() })
    }
}

enum StubOutcome {
    Ok(SourceYields),
    Fail(String),
    Panic(String),
}

/// Fetcher that answers with a fixed result after a simulated delay
pub struct StubFetcher {
    id: String,
    delay: Duration,
    outcome: StubOutcome,
}

impl StubFetcher {
    pub fn ok(id: &str, delay_ms: u64, yields: SourceYields) -> Self {
        Self::new(id, delay_ms, StubOutcome::Ok(yields))
    }

    pub fn failing(id: &str, delay_ms: u64, reason: &str) -> Self {
        Self::new(id, delay_ms, StubOutcome::Fail(reason.to_string()))
    }

    pub fn panicking(id: &str, delay_ms: u64, message: &str) -> Self {
        Self::new(id, delay_ms, StubOutcome::Panic(message.to_string()))
    }

    fn new(id: &str, delay_ms: u64, outcome: StubOutcome) -> Self {
        Self { id: id.to_string(), delay: Duration::from_millis(delay_ms), outcome }
    }
}

#[async_trait]
impl ProtocolFetcher for StubFetcher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self) -> ApyResult<SourceYields> {
        tokio::time::sleep(self.delay).await;
        match &self.outcome {
            StubOutcome::Ok(yields) => Ok(yields.clone()),
            StubOutcome::Fail(reason) => Err(ApyError::Timeout {
                context: reason.clone(),
                timeout: self.delay,
            }),
            StubOutcome::Panic(message) => panic!("{}", message),
        }
    }
}
