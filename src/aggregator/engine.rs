//! Source aggregation engine

use chrono::Utc;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::{
    errors::{ApyError, ApyResult},
    fetchers::ProtocolFetcher,
    types::{AggregationOutcome, PoolApy, SourceFailure, SourceYields},
};

pub struct SourceAggregator {
    fetchers: Vec<Arc<dyn ProtocolFetcher>>,
}

impl SourceAggregator {
    pub fn new(fetchers: Vec<Arc<dyn ProtocolFetcher>>) -> Self {
        Self { fetchers }
    }

    pub fn source_count(&self) -> usize {
        self.fetchers.len()
    }

    /// Runs every fetcher concurrently and waits for all of them to settle.
    /// Never fails: a failed source only shows up in `failures`.
    pub async fn aggregate(&self) -> AggregationOutcome {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();

        info!(run_id = %run_id, sources = self.fetchers.len(), "Starting aggregation run");

        // One task per fetcher, so a panic stays inside its own source
        let handles: Vec<_> = self
            .fetchers
            .iter()
            .map(|fetcher| {
                let fetcher = Arc::clone(fetcher);
                tokio::spawn(async move { fetcher.fetch().await })
            })
            .collect();

        let settled = join_all(handles)
            .await
            .into_iter()
            .zip(&self.fetchers)
            .map(|(joined, fetcher)| {
                let result = joined.unwrap_or_else(|e| Err(ApyError::TaskAborted(e.to_string())));
                (fetcher.id().to_string(), result)
            })
            .collect();

        let merged = merge_settled(settled);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            run_id = %run_id,
            pools = merged.pools.len(),
            succeeded = merged.succeeded.len(),
            failed = merged.failures.len(),
            "Aggregation run finished in {}ms",
            elapsed_ms
        );

        AggregationOutcome {
            run_id,
            started_at,
            elapsed_ms,
            pools: merged.pools,
            succeeded: merged.succeeded,
            failures: merged.failures,
        }
    }
}

#[derive(Debug, Default)]
pub struct MergedSources {
    pub pools: BTreeMap<String, PoolApy>,
    pub succeeded: Vec<String>,
    pub failures: Vec<SourceFailure>,
    owners: HashMap<String, String>,
}

/// Folds settled fetcher results, in registration order, into one pool map.
/// A pool name claimed by a later source replaces the earlier entry.
pub fn merge_settled(settled: Vec<(String, ApyResult<SourceYields>)>) -> MergedSources {
    settled
        .into_iter()
        .fold(MergedSources::default(), |mut merged, (source, result)| {
            match result {
                Ok(yields) => {
                    if yields.is_empty() {
                        debug!(source = %source, "Source succeeded without any computable pool");
                    } else {
                        debug!(source = %source, pools = yields.len(), "Source succeeded");
                    }
                    for (name, apy) in yields.into_pool_apys() {
                        if let Some(previous) = merged.owners.insert(name.clone(), source.clone()) {
                            warn!(
                                pool = %name,
                                previous = %previous,
                                replacement = %source,
                                "Duplicate pool name, keeping the later source"
                            );
                        }
                        merged.pools.insert(name, apy);
                    }
                    merged.succeeded.push(source);
                }
                Err(e) => {
                    warn!(source = %source, transient = e.is_transient(), "Source failed: {}", e);
                    merged.failures.push(SourceFailure {
                        source,
                        reason: e.to_string(),
                    });
                }
            }
            merged
        })
}
