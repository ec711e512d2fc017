use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub redis_url: String,
    pub default_ttl_secs: u64,
    /// Concurrent misses on one key share a single aggregation
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            backend: CacheBackendKind::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            default_ttl_secs: 30,
            single_flight: true,
        }
    }
}
