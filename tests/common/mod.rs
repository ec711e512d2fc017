#![allow(dead_code)]

use serde_json::{json, Value};
use tokio::time::Duration;
use wiremock::MockServer;
use token_feed::config::cache::CacheBackendKind;
use token_feed::config::loader::AppConfig;
use token_feed::upstream::ExponentialBackoff;

pub const SOL: &str = "So11111111111111111111111111111111111111112";
pub const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
pub const WIF: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

pub fn pair(chain: &str, address: &str, symbol: &str, volume_usd: f64, liquidity: f64) -> Value {
    json!({
        "chainId": chain,
        "dexId": "raydium",
        "pairAddress": format!("pair-{}", symbol),
        "baseToken": {"address": address, "name": symbol, "symbol": symbol},
        "quoteToken": {"address": SOL, "name": "Wrapped SOL", "symbol": "SOL"},
        "priceNative": "0.5",
        "priceUsd": "2.0",
        "volume": {"h24": volume_usd},
        "priceChange": {"h1": 1.5},
        "liquidity": {"usd": liquidity * 2.0, "quote": liquidity},
        "marketCap": 1000.0,
        "txns": {"h24": {"buys": 3, "sells": 4}}
    })
}

pub fn pairs_body(pairs: Vec<Value>) -> Value {
    json!({ "schemaVersion": "1.0.0", "pairs": pairs })
}

pub fn fast_backoff(max_attempts: u32) -> ExponentialBackoff {
    ExponentialBackoff::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5))
}

/// Configuration pointing both providers at `server`, with a memory cache
/// and millisecond retries.
pub fn test_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.cache.backend = CacheBackendKind::Memory;
    config.dexscreener.base_url = server.uri();
    config.jupiter.base_url = format!("{}/price", server.uri());
    config.backoff.max_attempts = 2;
    config.backoff.base_delay_ms = 1;
    config.backoff.max_delay_ms = 5;
    config
}
