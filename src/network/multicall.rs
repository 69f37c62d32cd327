//! Batched chain reader over Multicall3
//!
//! Every `batch_read` is a single `eth_call` to `aggregate3` with
//! `allowFailure = true`, so one reverting element never hides the others.

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    rpc::types::eth::TransactionRequest,
    sol,
    sol_types::SolCall,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use crate::{
    errors::{ApyError, ApyResult},
    types::{MULTICALL3, Network},
    ConcreteProvider,
};

sol! {
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls)
            external payable returns (Result[] memory returnData);

        function getBlockNumber() external view returns (uint256 blockNumber);
    }
}

/// One read-only call: target contract plus ABI-encoded selector and arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadCall {
    pub target: Address,
    pub calldata: Bytes,
}

impl ReadCall {
    pub fn new(target: Address, calldata: impl Into<Bytes>) -> Self {
        Self {
            target,
            calldata: calldata.into(),
        }
    }

    /// Current block number, answered by Multicall3 itself
    pub fn block_number() -> Self {
        Self::new(MULTICALL3, IMulticall3::getBlockNumberCall {}.abi_encode())
    }
}

/// Per-element outcome of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResult {
    Success(Bytes),
    Failure,
}

impl RawResult {
    pub fn is_success(&self) -> bool {
        matches!(self, RawResult::Success(_))
    }

    /// The `index`-th 32-byte word of the return data. Static tuple members
    /// sit one word each, so this also reads single fields of a struct return.
    pub fn word(&self, index: usize) -> Option<U256> {
        match self {
            RawResult::Success(data) => {
                let start = index.checked_mul(32)?;
                let end = start.checked_add(32)?;
                data.get(start..end).map(U256::from_be_slice)
            }
            RawResult::Failure => None,
        }
    }
}

#[async_trait]
pub trait BatchedChainReader: Send + Sync {
    fn network(&self) -> Network;

    /// Output has the same length and order as `calls`
    async fn batch_read(&self, calls: &[ReadCall]) -> ApyResult<Vec<RawResult>>;
}

pub struct Multicall3Reader {
    network: Network,
    provider: Arc<ConcreteProvider>,
    timeout: Duration,
}

impl Multicall3Reader {
    pub fn new(network: Network, provider: Arc<ConcreteProvider>, timeout: Duration) -> Self {
        Self {
            network,
            provider,
            timeout,
        }
    }
}

#[async_trait]
impl BatchedChainReader for Multicall3Reader {
    fn network(&self) -> Network {
        self.network
    }

    async fn batch_read(&self, calls: &[ReadCall]) -> ApyResult<Vec<RawResult>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let call3s = calls
            .iter()
            .map(|call| IMulticall3::Call3 {
                target: call.target,
                allowFailure: true,
                callData: call.calldata.clone(),
            })
            .collect();

        let calldata = IMulticall3::aggregate3Call { calls: call3s }.abi_encode();
        let tx = TransactionRequest::default()
            .to(MULTICALL3)
            .input(calldata.into());

        let returned = tokio::time::timeout(self.timeout, self.provider.call(&tx))
            .await
            .map_err(|_| ApyError::Timeout {
                context: format!("aggregate3 on {}", self.network),
                timeout: self.timeout,
            })?
            .map_err(|e| ApyError::network(format!("aggregate3 on {} failed", self.network), e))?;

        let decoded = IMulticall3::aggregate3Call::abi_decode_returns(&returned, true)
            .map_err(|e| ApyError::parsing("aggregate3 return data", e))?;

        let results = into_raw_results(calls.len(), decoded.returnData)?;

        debug!(
            network = %self.network,
            calls = calls.len(),
            failed = results.iter().filter(|r| !r.is_success()).count(),
            "Multicall3 batch in {:?}",
            start.elapsed()
        );

        Ok(results)
    }
}

/// Map decoded `aggregate3` results onto the request order
pub fn into_raw_results(
    expected: usize,
    returned: Vec<IMulticall3::Result>,
) -> ApyResult<Vec<RawResult>> {
    if returned.len() != expected {
        return Err(ApyError::parsing(
            "aggregate3 return data",
            anyhow::anyhow!("expected {} results, got {}", expected, returned.len()),
        ));
    }

    Ok(returned
        .into_iter()
        .map(|r| {
            if r.success {
                RawResult::Success(r.returnData)
            } else {
                RawResult::Failure
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn word_bytes(values: &[u64]) -> Bytes {
        let mut out = Vec::new();
        for v in values {
            out.extend_from_slice(&U256::from(*v).to_be_bytes::<32>());
        }
        out.into()
    }

    #[test]
    fn test_word_reads_tuple_members() {
        let result = RawResult::Success(word_bytes(&[7, 1000, 1_700_000_000]));
        assert_eq!(result.word(0), Some(U256::from(7u64)));
        assert_eq!(result.word(1), Some(U256::from(1000u64)));
        assert_eq!(result.word(2), Some(U256::from(1_700_000_000u64)));
        assert_eq!(result.word(3), None);
        assert_eq!(RawResult::Failure.word(0), None);
    }

    proptest! {
        #[test]
        fn results_keep_request_order(pattern in proptest::collection::vec(any::<bool>(), 0..64)) {
            let returned: Vec<IMulticall3::Result> = pattern
                .iter()
                .enumerate()
                .map(|(i, ok)| IMulticall3::Result {
                    success: *ok,
                    returnData: if *ok { word_bytes(&[i as u64]) } else { Bytes::new() },
                })
                .collect();

            let results = into_raw_results(pattern.len(), returned).unwrap();
            prop_assert_eq!(results.len(), pattern.len());
            for (i, ok) in pattern.iter().enumerate() {
                prop_assert_eq!(results[i].is_success(), *ok);
                let expected = if *ok { Some(U256::from(i as u64)) } else { None };
                prop_assert_eq!(results[i].word(0), expected);
            }
        }
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let returned = vec![IMulticall3::Result { success: true, returnData: Bytes::new() }];
        assert!(into_raw_results(2, returned).is_err());
    }

    #[test]
    fn test_block_number_call_targets_multicall() {
        let call = ReadCall::block_number();
        assert_eq!(call.target, MULTICALL3);
        assert_eq!(&call.calldata[..], &IMulticall3::getBlockNumberCall::SELECTOR[..]);
    }
}
