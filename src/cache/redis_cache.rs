use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::time::{timeout, Duration};
use crate::cache::CacheBackend;
use crate::error::{Error, Result};

const COMMAND_TIMEOUT: Duration = Duration::from_millis(1_000);
const SCAN_BATCH: usize = 500;

/// Redis backend over a reconnecting multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| Error::CacheError("Timed out connecting to Redis".to_string()))??;

        tracing::info!("Redis connected successfully");
        Ok(RedisCache { connection })
    }
}

async fn bounded<T, F>(fut: F) -> Result<T>
where
    F: std::future::Future<Output = redis::RedisResult<T>>,
{
    timeout(COMMAND_TIMEOUT, fut)
        .await
        .map_err(|_| Error::CacheError("Redis command timeout".to_string()))?
        .map_err(Error::from)
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let seconds = ttl.as_secs().max(1) as usize;
        bounded(conn.set_ex::<_, _, ()>(key, value, seconds)).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        bounded(conn.del::<_, ()>(key)).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        bounded(conn.exists::<_, bool>(key)).await
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.connection.clone();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = bounded(
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn),
            )
            .await?;

            keys.extend(batch);
            if next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        bounded(redis::cmd("FLUSHDB").query_async::<_, ()>(&mut conn)).await
    }
}
