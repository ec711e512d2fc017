use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DexScreenerConfig {
    pub base_url: String,
    pub chain_id: String,
    pub search_query: String,
    pub rate_limit: usize,
    pub window_ms: u64,
    pub timeout_ms: u64,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        DexScreenerConfig {
            base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            chain_id: "solana".to_string(),
            search_query: "solana".to_string(),
            rate_limit: 300,
            window_ms: 60_000,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct JupiterConfig {
    pub base_url: String,
    pub rate_limit: usize,
    pub window_ms: u64,
    pub timeout_ms: u64,
    pub max_ids: usize,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        JupiterConfig {
            base_url: "https://price.jup.ag/v4/price".to_string(),
            rate_limit: 600,
            window_ms: 60_000,
            timeout_ms: 10_000,
            max_ids: 100,
        }
    }
}
