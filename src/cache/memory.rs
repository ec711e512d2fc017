use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};
use crate::cache::CacheBackend;
use crate::error::Result;
use crate::utils::helper::glob_match;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local backend. Expired entries are dropped when next touched.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            entries: DashMap::new(),
        }
    }

    fn live(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let value = self.entries.get(key).map(|e| (e.value.clone(), e.expires_at > now));

        match value {
            Some((value, true)) => Some(value),
            Some((_, false)) => {
                self.entries.remove_if(key, |_, e| e.expires_at <= now);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live(key))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.entries.insert(key.to_string(), Entry {
            value,
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live(key).is_some())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        self.entries.retain(|_, e| e.expires_at > now);

        Ok(self.entries.iter()
            .filter(|e| glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect())
    }

    async fn flush(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
