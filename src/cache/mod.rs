pub mod memory;
pub mod redis_cache;

use std::sync::Arc;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Duration;
use crate::error::Result;
use crate::observability::metrics::{CACHE_ERRORS, CACHE_HITS, CACHE_MISSES};

pub use self::memory::MemoryCache;
pub use self::redis_cache::RedisCache;

pub const DEFAULT_TTL_SECS: u64 = 30;

/// Raw string store with per-key expiry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
    /// Keys matching a glob pattern (`*`, `?`)
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    async fn flush(&self) -> Result<()>;
}

/// Cache-aside store over a [`CacheBackend`].
///
/// Values are JSON on the wire. Backend failures never reach the caller:
/// reads degrade to a miss, writes and deletes are logged and dropped. A
/// value that fails to parse is a miss.
#[derive(Clone)]
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl_secs: u64) -> Self {
        CacheService {
            backend,
            default_ttl: Duration::from_secs(default_ttl_secs.max(1)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCache::new()), DEFAULT_TTL_SECS)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                CACHE_ERRORS.inc();
                tracing::error!("Cache get error for {}: {}", key, e);
                None
            }
        };

        let value = raw.and_then(|data| match serde_json::from_str::<T>(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        });

        if value.is_some() { CACHE_HITS.inc() } else { CACHE_MISSES.inc() }
        value
    }

    /// Store `value` under `key`; `ttl_secs` falls back to the default TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: Option<u64>) {
        let ttl = ttl_secs
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(self.default_ttl);

        let data = match serde_json::to_string(value) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Cache serialization error for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.backend.set(key, data, ttl).await {
            CACHE_ERRORS.inc();
            tracing::error!("Cache set error for {}: {}", key, e);
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            CACHE_ERRORS.inc();
            tracing::error!("Cache delete error for {}: {}", key, e);
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.backend.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                CACHE_ERRORS.inc();
                tracing::error!("Cache exists error for {}: {}", key, e);
                false
            }
        }
    }

    /// Purge keys matching `pattern`, or the whole store when `None`.
    pub async fn clear(&self, pattern: Option<&str>) {
        let result = match pattern {
            None => self.backend.flush().await,
            Some(pattern) => self.clear_matching(pattern).await,
        };

        if let Err(e) = result {
            CACHE_ERRORS.inc();
            tracing::error!("Cache clear error: {}", e);
        }
    }

    async fn clear_matching(&self, pattern: &str) -> Result<()> {
        let keys = self.backend.keys(pattern).await?;
        for key in &keys {
            self.backend.delete(key).await?;
        }
        tracing::debug!("Cleared {} cache keys matching {}", keys.len(), pattern);
        Ok(())
    }
}
