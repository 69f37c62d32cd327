//! Start-up retries for RPC connections
//!
//! Only provider setup retries. Reads made during an aggregation run never
//! do; the next scheduled run is their retry.

use std::future::Future;
use std::time::Duration;
use tracing::warn;
use crate::errors::{ApyError, ApyResult};

/// Doubling back-off between connection attempts, capped at `max_delay`
#[derive(Debug, Clone, Copy)]
pub struct StartupRetry {
    pub attempts: u32,
    pub first_delay: Duration,
    pub max_delay: Duration,
}

impl Default for StartupRetry {
    fn default() -> Self {
        Self {
            attempts: 5,
            first_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl StartupRetry {
    /// Delay after the `attempt`-th failure (1-based), with up to 10% jitter
    fn delay_after(&self, attempt: u32) -> Duration {
        let doubled = self.first_delay.saturating_mul(1 << attempt.saturating_sub(1).min(16));
        let base = doubled.min(self.max_delay);
        base.mul_f64(1.0 + 0.1 * rand::random::<f64>())
    }

    pub async fn run<F, Fut, T>(&self, what: &str, operation: F) -> ApyResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => {
                    return Err(ApyError::Network {
                        message: format!("{} failed after {} attempts", what, attempt),
                        source: Some(e),
                    });
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!("{} attempt {}/{} failed: {}. Retrying in {:?}", what, attempt, attempts, e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
