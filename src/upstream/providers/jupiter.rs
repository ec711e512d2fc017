use std::collections::HashMap;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::time::Duration;
use tracing::Instrument;
use crate::config::upstream::JupiterConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::{UPSTREAM_FAILURES, UPSTREAM_REQUESTS};
use crate::observability::tracing::trace_upstream_request;
use crate::upstream::backoff::ExponentialBackoff;
use crate::upstream::providers::PriceProvider;
use crate::upstream::rate_limiter::SlidingWindowRateLimiter;

pub const SOURCE_ID: &str = "jupiter";

pub struct JupiterProvider {
    client: Client,
    config: JupiterConfig,
    rate_limiter: SlidingWindowRateLimiter,
    backoff: ExponentialBackoff,
}

impl JupiterProvider {
    pub fn new(config: JupiterConfig, backoff: ExponentialBackoff) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let rate_limiter = SlidingWindowRateLimiter::new(
            config.rate_limit,
            Duration::from_millis(config.window_ms),
        );

        Ok(JupiterProvider {
            client,
            config,
            rate_limiter,
            backoff,
        })
    }

    pub fn max_ids(&self) -> usize {
        self.config.max_ids
    }

    async fn fetch_prices(&self, ids: &str) -> Result<HashMap<String, f64>> {
        self.rate_limiter.acquire(SOURCE_ID).await;
        UPSTREAM_REQUESTS.with_label_values(&[SOURCE_ID]).inc();

        let result: Result<HashMap<String, f64>> = async {
            let resp = self.client
                .get(&self.config.base_url)
                .query(&[("ids", ids)])
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        Error::UpstreamTimeout { upstream: SOURCE_ID.to_string() }
                    } else {
                        Error::Http(e)
                    }
                })?;

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(Error::RateLimited { upstream: SOURCE_ID.to_string() });
            }
            if status == StatusCode::FORBIDDEN {
                return Err(Error::UpstreamBlocked { upstream: SOURCE_ID.to_string() });
            }
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::UpstreamStatus {
                    upstream: SOURCE_ID.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            let body: PriceEnvelope = resp.json().await
                .map_err(|e| Error::DeserializationError(e.to_string()))?;
            Ok(body.into_price_map())
        }
        .await;

        match &result {
            Ok(prices) => tracing::debug!("Jupiter fetched prices for {} tokens", prices.len()),
            Err(e) => {
                UPSTREAM_FAILURES.with_label_values(&[SOURCE_ID]).inc();
                tracing::error!("Jupiter price fetch error: {}", e);
            }
        }
        result
    }
}

#[async_trait]
impl PriceProvider for JupiterProvider {
    async fn get_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.iter()
            .take(self.config.max_ids)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let span = trace_upstream_request(SOURCE_ID, "prices");
        self.backoff
            .execute(|| self.fetch_prices(&joined), "Jupiter price fetch")
            .instrument(span)
            .await
    }
}

#[derive(Debug, Default, Deserialize)]
struct PriceEnvelope {
    #[serde(default)]
    data: HashMap<String, Value>,
}

impl PriceEnvelope {
    /// Entries without a usable non-zero price are skipped. Prices may arrive
    /// as JSON numbers or numeric strings.
    fn into_price_map(self) -> HashMap<String, f64> {
        self.data.into_iter()
            .filter_map(|(id, entry)| {
                let price = match entry.get("price")? {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                }?;

                (price.is_finite() && price != 0.0).then_some((id, price))
            })
            .collect()
    }
}
