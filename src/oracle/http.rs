//! HTTP price oracle backed by a `{id: price}` JSON endpoint per namespace

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};
use super::PriceOracle;
use crate::{
    errors::{ApyError, ApyResult},
    types::OracleNamespace,
};

type PriceMap = Arc<HashMap<String, Decimal>>;

struct CachedPrices {
    prices: PriceMap,
    fetched_at: Instant,
}

/// Cached map of one namespace. The lock is held across a refresh, so
/// concurrent lookups on a cold slot share a single request.
type PriceSlot = Mutex<Option<CachedPrices>>;

pub struct HttpPriceOracle {
    http_client: Client,
    base_url: String,
    timeout: Duration,
    cache_ttl: Duration,
    tokens: PriceSlot,
    lps: PriceSlot,
}

impl HttpPriceOracle {
    pub fn new(base_url: &str, timeout: Duration, cache_ttl: Duration) -> ApyResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApyError::network("Failed to build HTTP client", e))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            cache_ttl,
            tokens: Mutex::new(None),
            lps: Mutex::new(None),
        })
    }

    fn endpoint(namespace: OracleNamespace) -> &'static str {
        match namespace {
            OracleNamespace::Tokens => "prices",
            OracleNamespace::Lps => "lps",
        }
    }

    fn slot(&self, namespace: OracleNamespace) -> &PriceSlot {
        match namespace {
            OracleNamespace::Tokens => &self.tokens,
            OracleNamespace::Lps => &self.lps,
        }
    }

    async fn namespace_prices(&self, namespace: OracleNamespace) -> ApyResult<PriceMap> {
        let mut slot = self.slot(namespace).lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                trace!("Using cached {} prices", namespace);
                return Ok(cached.prices.clone());
            }
        }

        let prices: PriceMap = Arc::new(self.fetch_namespace(namespace).await?);
        *slot = Some(CachedPrices {
            prices: prices.clone(),
            fetched_at: Instant::now(),
        });

        Ok(prices)
    }

    async fn fetch_namespace(&self, namespace: OracleNamespace) -> ApyResult<HashMap<String, Decimal>> {
        let url = format!("{}/{}", self.base_url, Self::endpoint(namespace));

        let response = self.http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApyError::Timeout {
                        context: format!("GET {}", url),
                        timeout: self.timeout,
                    }
                } else {
                    ApyError::network(format!("GET {} failed", url), e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ApyError::Oracle {
                message: format!("{} returned {}", url, status),
            });
        }

        let json: serde_json::Value = response.json().await
            .map_err(|e| ApyError::parsing(format!("{} body", url), e))?;

        let prices = parse_price_map(&json)?;
        debug!("Fetched {} {} prices", prices.len(), namespace);
        Ok(prices)
    }
}

#[async_trait]
impl PriceOracle for HttpPriceOracle {
    async fn price(&self, namespace: OracleNamespace, id: &str) -> ApyResult<Decimal> {
        let prices = self.namespace_prices(namespace).await?;

        match prices.get(id) {
            Some(price) if *price > Decimal::ZERO => Ok(*price),
            _ => Err(ApyError::PriceUnavailable {
                namespace,
                id: id.to_string(),
            }),
        }
    }
}

/// Entries that are not numbers (e.g. `null`) are skipped
pub fn parse_price_map(json: &serde_json::Value) -> ApyResult<HashMap<String, Decimal>> {
    let object = json.as_object().ok_or_else(|| {
        ApyError::parsing("price map", anyhow::anyhow!("expected a JSON object"))
    })?;

    let mut prices = HashMap::with_capacity(object.len());
    for (id, value) in object {
        let text = match value {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            _ => continue,
        };

        let parsed = Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text));
        match parsed {
            Ok(price) => {
                prices.insert(id.clone(), price);
            }
            Err(_) => trace!("Skipping unparseable price for {}: {}", id, text),
        }
    }

    Ok(prices)
}
