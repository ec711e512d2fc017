use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::Duration;
use tracing::Instrument;
use crate::config::upstream::DexScreenerConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::{UPSTREAM_FAILURES, UPSTREAM_REQUESTS};
use crate::observability::tracing::trace_upstream_request;
use crate::types::TokenRecord;
use crate::upstream::backoff::ExponentialBackoff;
use crate::upstream::providers::ListingProvider;
use crate::upstream::rate_limiter::SlidingWindowRateLimiter;
use crate::utils::helper::current_timestamp_ms;

pub const SOURCE_ID: &str = "dexscreener";

pub struct DexScreenerProvider {
    client: Client,
    config: DexScreenerConfig,
    rate_limiter: SlidingWindowRateLimiter,
    backoff: ExponentialBackoff,
}

/// What one HTTP exchange produced, before transformation.
enum PairsResponse {
    Pairs(Vec<DexPair>),
    Blocked,
    NotFound,
}

impl DexScreenerProvider {
    pub fn new(config: DexScreenerConfig, backoff: ExponentialBackoff) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent("token-feed/0.1")
            .build()?;

        let rate_limiter = SlidingWindowRateLimiter::new(
            config.rate_limit,
            Duration::from_millis(config.window_ms),
        );

        Ok(DexScreenerProvider {
            client,
            config,
            rate_limiter,
            backoff,
        })
    }

    pub fn backoff(&self) -> &ExponentialBackoff {
        &self.backoff
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn fetch_pairs(&self, path: &str, query: Option<&str>) -> Result<PairsResponse> {
        self.rate_limiter.acquire(SOURCE_ID).await;
        UPSTREAM_REQUESTS.with_label_values(&[SOURCE_ID]).inc();

        let mut request = self.client.get(self.url(path));
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }

        let result: Result<PairsResponse> = async {
            let resp = request.send().await.map_err(transport_error)?;

            match resp.status() {
                StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited {
                    upstream: SOURCE_ID.to_string(),
                }),
                StatusCode::FORBIDDEN => Ok(PairsResponse::Blocked),
                StatusCode::NOT_FOUND => Ok(PairsResponse::NotFound),
                status if !status.is_success() => {
                    let body = resp.text().await.unwrap_or_default();
                    Err(Error::UpstreamStatus {
                        upstream: SOURCE_ID.to_string(),
                        status: status.as_u16(),
                        body,
                    })
                }
                _ => {
                    let body: PairsEnvelope = resp.json().await
                        .map_err(|e| Error::DeserializationError(e.to_string()))?;
                    Ok(PairsResponse::Pairs(body.into_pairs()))
                }
            }
        }
        .await;

        if let Err(e) = &result {
            UPSTREAM_FAILURES.with_label_values(&[SOURCE_ID]).inc();
            tracing::error!("DexScreener request to {} failed: {}", path, e);
        }
        result
    }
}

#[async_trait]
impl ListingProvider for DexScreenerProvider {
    async fn search(&self, query: &str) -> Result<Vec<TokenRecord>> {
        let span = trace_upstream_request(SOURCE_ID, "search");

        self.backoff.execute(move || async move {
            match self.fetch_pairs("/search", Some(query)).await? {
                PairsResponse::Pairs(pairs) => {
                    tracing::info!("DexScreener returned {} pairs", pairs.len());
                    Ok(transform_pairs(pairs, &self.config.chain_id, current_timestamp_ms()))
                }
                PairsResponse::Blocked => {
                    tracing::warn!("DexScreener blocking request, returning empty result");
                    Ok(Vec::new())
                }
                PairsResponse::NotFound => Ok(Vec::new()),
            }
        }, "DexScreener search")
        .instrument(span)
        .await
    }

    async fn get_token_by_address(&self, address: &str) -> Result<Option<TokenRecord>> {
        let span = trace_upstream_request(SOURCE_ID, "token");
        let path = &format!("/tokens/{}", address);
        let label = format!("DexScreener token fetch ({})", address);

        self.backoff.execute(move || async move {
            match self.fetch_pairs(path, None).await? {
                PairsResponse::Pairs(pairs) => {
                    Ok(transform_pairs(pairs, &self.config.chain_id, current_timestamp_ms())
                        .into_iter()
                        .next())
                }
                PairsResponse::Blocked => {
                    tracing::warn!("DexScreener blocking request for {}", address);
                    Ok(None)
                }
                PairsResponse::NotFound => Ok(None),
            }
        }, &label)
        .instrument(span)
        .await
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::UpstreamTimeout { upstream: SOURCE_ID.to_string() }
    } else {
        Error::Http(e)
    }
}

/// Keep pairs on `chain_id` and convert them to canonical records.
///
/// Market cap and volume are quoted in USD upstream; dividing by the USD unit
/// price approximates the native quote unit (divisor 1 when unknown).
pub fn transform_pairs(pairs: Vec<DexPair>, chain_id: &str, now_ms: u64) -> Vec<TokenRecord> {
    pairs.into_iter()
        .filter_map(|pair| {
            if pair.chain_id.as_deref() != Some(chain_id) {
                return None;
            }
            let base = pair.base_token.as_ref()?;
            let address = base.address.as_deref().filter(|a| !a.is_empty())?.to_string();
            Some((address, pair))
        })
        .map(|(address, pair)| {
            let unit_price = pair.price_usd.as_deref()
                .and_then(parse_number)
                .filter(|p| *p > 0.0)
                .unwrap_or(1.0);

            let market_cap = pair.market_cap
                .filter(|v| *v != 0.0)
                .or(pair.fdv)
                .unwrap_or(0.0);

            let volume_24h = pair.volume.and_then(|v| v.h24).unwrap_or(0.0);
            let transaction_count = pair.txns
                .and_then(|t| t.h24)
                .map(|t| t.buys + t.sells)
                .unwrap_or(0);

            let (token_name, token_ticker) = pair.base_token
                .map(|t| (t.name.unwrap_or_default(), t.symbol.unwrap_or_default()))
                .unwrap_or_default();

            TokenRecord {
                token_address: address,
                token_name,
                token_ticker,
                price_sol: pair.price_native.as_deref().and_then(parse_number).unwrap_or(0.0),
                market_cap_sol: market_cap / unit_price,
                volume_sol: volume_24h / unit_price,
                liquidity_sol: pair.liquidity.and_then(|l| l.quote).unwrap_or(0.0),
                transaction_count,
                price_1hr_change: pair.price_change.and_then(|c| c.h1).unwrap_or(0.0),
                protocol: pair.dex_id
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                last_updated: now_ms,
            }
        })
        .collect()
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Deserialize)]
struct PairsEnvelope {
    #[serde(default)]
    pairs: Option<Vec<serde_json::Value>>,
}

impl PairsEnvelope {
    /// Entries that do not fit [`DexPair`] are dropped, not the whole response.
    fn into_pairs(self) -> Vec<DexPair> {
        let raw = self.pairs.unwrap_or_default();
        let total = raw.len();
        let pairs: Vec<DexPair> = raw.into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(pair) => Some(pair),
                Err(e) => {
                    tracing::debug!("Skipping malformed DexScreener pair: {}", e);
                    None
                }
            })
            .collect();

        if pairs.len() < total {
            tracing::warn!("Skipped {} malformed DexScreener pairs", total - pairs.len());
        }
        pairs
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub pair_address: Option<String>,
    #[serde(default)]
    pub base_token: Option<DexToken>,
    #[serde(default)]
    pub price_native: Option<String>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub volume: Option<DexVolume>,
    #[serde(default)]
    pub price_change: Option<DexPriceChange>,
    #[serde(default)]
    pub liquidity: Option<DexLiquidity>,
    #[serde(default)]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub txns: Option<DexTxns>,
}

#[derive(Debug, Deserialize)]
pub struct DexToken {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DexVolume {
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DexPriceChange {
    #[serde(default)]
    pub h1: Option<f64>,
    #[serde(default)]
    pub h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DexLiquidity {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(default)]
    pub base: Option<f64>,
    #[serde(default)]
    pub quote: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct DexTxns {
    #[serde(default)]
    pub h1: Option<DexTxnCount>,
    #[serde(default)]
    pub h24: Option<DexTxnCount>,
}

#[derive(Debug, Deserialize)]
pub struct DexTxnCount {
    #[serde(default)]
    pub buys: u64,
    #[serde(default)]
    pub sells: u64,
}
