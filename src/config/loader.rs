use crate::config::cache::CacheConfig;
use crate::config::server::{BroadcastConfig, PaginationConfig, ServerConfig};
use crate::config::upstream::{DexScreenerConfig, JupiterConfig};
use crate::config::*;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub dexscreener: DexScreenerConfig,
    pub jupiter: JupiterConfig,
    pub backoff: BackoffConfig,
    pub broadcast: BroadcastConfig,
    pub pagination: PaginationConfig,
    pub fallback: FallbackConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("TOKENFEED")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cache::CacheBackendKind;
    use config::FileFormat;

    #[test]
    fn partial_sources_fill_in_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[cache]\nbackend = \"memory\"\n[dexscreener]\nrate_limit = 10\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.cache.default_ttl_secs, 30);
        assert_eq!(config.dexscreener.rate_limit, 10);
        assert_eq!(config.dexscreener.window_ms, 60_000);
        assert_eq!(config.backoff.max_attempts, 5);
        assert_eq!(config.broadcast.interval_secs, 30);
        assert_eq!(config.fallback.size, 50);
    }
}
