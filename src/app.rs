use std::sync::Arc;
use crate::api::AppState;
use crate::broadcast::TokenBroadcaster;
use crate::cache::{CacheService, MemoryCache, RedisCache};
use crate::config::cache::{CacheBackendKind, CacheConfig};
use crate::config::loader::AppConfig;
use crate::error::Result;
use crate::service::TokenService;
use crate::upstream::providers::ListingProvider;
use crate::upstream::providers::dexscreener::DexScreenerProvider;
use crate::upstream::providers::jupiter::JupiterProvider;
use crate::upstream::{ExponentialBackoff, TokenAggregator};

/// Redis when configured and reachable, otherwise the in-process store.
pub async fn build_cache(config: &CacheConfig) -> CacheService {
    let memory = || CacheService::new(Arc::new(MemoryCache::new()), config.default_ttl_secs);

    match config.backend {
        CacheBackendKind::Memory => memory(),
        CacheBackendKind::Redis => match RedisCache::connect(&config.redis_url).await {
            Ok(redis) => CacheService::new(Arc::new(redis), config.default_ttl_secs),
            Err(e) => {
                tracing::warn!("Redis unavailable ({}), using in-memory cache", e);
                memory()
            }
        },
    }
}

/// Wire providers, aggregator, service and broadcaster from configuration.
/// Each provider gets its own limiter and backoff state.
pub fn build_state(config: &AppConfig, cache: CacheService) -> Result<Arc<AppState>> {
    let listing: Arc<dyn ListingProvider> = Arc::new(DexScreenerProvider::new(
        config.dexscreener.clone(),
        ExponentialBackoff::from_config(&config.backoff),
    )?);

    let jupiter = JupiterProvider::new(
        config.jupiter.clone(),
        ExponentialBackoff::from_config(&config.backoff),
    )?;
    let enrichment_cap = jupiter.max_ids();

    let aggregator = TokenAggregator::new(listing.clone(), Arc::new(jupiter))
        .with_search_query(config.dexscreener.search_query.clone())
        .with_fallback_size(config.fallback.size)
        .with_enrichment_cap(enrichment_cap);

    let service = Arc::new(
        TokenService::new(cache, aggregator, listing)
            .with_single_flight(config.cache.single_flight),
    );

    let broadcaster = Arc::new(TokenBroadcaster::from_config(service.clone(), &config.broadcast));

    Ok(Arc::new(AppState {
        service,
        broadcaster,
        pagination: config.pagination.clone(),
    }))
}
