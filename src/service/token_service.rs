use std::sync::Arc;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use crate::cache::CacheService;
use crate::error::{Error, Result};
use crate::types::{PaginatedResult, QueryOptions, SortField, SortOrder, TokenRecord};
use crate::service::ranking::{paginate, sort_tokens};
use crate::upstream::TokenAggregator;
use crate::upstream::providers::ListingProvider;

const TOKEN_LIST_PREFIX: &str = "tokens";
const TOKEN_PREFIX: &str = "token";

/// Outcome of one aggregation, shared by every caller that joined it.
type Flight = Arc<OnceCell<std::result::Result<Vec<TokenRecord>, String>>>;

pub fn token_list_key(sort_by: SortField, sort_order: SortOrder) -> String {
    format!("{}:all:sorted:{}:{}", TOKEN_LIST_PREFIX, sort_by, sort_order)
}

pub fn token_key(address: &str) -> String {
    format!("{}:{}", TOKEN_PREFIX, address)
}

/// Read side of the pipeline: cache-aside over the aggregator, then
/// sort and paginate per request.
pub struct TokenService {
    cache: CacheService,
    aggregator: TokenAggregator,
    listing: Arc<dyn ListingProvider>,
    single_flight: bool,
    inflight: DashMap<String, Flight>,
}

impl TokenService {
    pub fn new(
        cache: CacheService,
        aggregator: TokenAggregator,
        listing: Arc<dyn ListingProvider>,
    ) -> Self {
        TokenService {
            cache,
            aggregator,
            listing,
            single_flight: true,
            inflight: DashMap::new(),
        }
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub async fn get_tokens(&self, options: &QueryOptions) -> Result<PaginatedResult> {
        let key = token_list_key(options.sort_by, options.sort_order);
        let mut tokens = self.load_tokens(&key).await?;

        sort_tokens(&mut tokens, options.sort_by, options.sort_order);
        Ok(paginate(&tokens, options.offset(), options.limit))
    }

    /// `Ok(None)` when the primary provider has no pairs for `address`.
    /// Only found records are cached.
    pub async fn get_token_by_address(&self, address: &str) -> Result<Option<TokenRecord>> {
        let key = token_key(address);

        if let Some(token) = self.cache.get::<TokenRecord>(&key).await {
            tracing::info!("Cache hit for token {}", address);
            return Ok(Some(token));
        }

        tracing::info!("Cache miss for token {}, fetching from primary provider", address);
        let token = self.listing.get_token_by_address(address).await?;

        if let Some(token) = &token {
            self.cache.set(&key, token, None).await;
        }
        Ok(token)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear(Some(format!("{}:*", TOKEN_LIST_PREFIX).as_str())).await;
        self.cache.clear(Some(format!("{}:*", TOKEN_PREFIX).as_str())).await;
        tracing::info!("Token cache cleared");
    }

    async fn load_tokens(&self, key: &str) -> Result<Vec<TokenRecord>> {
        if let Some(tokens) = self.cached(key).await {
            return Ok(tokens);
        }

        if !self.single_flight {
            return self.refresh(key).await;
        }

        // Concurrent misses on one key join the same flight and receive its result.
        let flight = self.inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let outcome = flight
            .get_or_init(|| async { self.refresh(key).await.map_err(|e| e.to_string()) })
            .await
            .clone();

        self.inflight.remove_if(key, |_, current| Arc::ptr_eq(current, &flight));
        outcome.map_err(Error::AggregationFailed)
    }

    async fn cached(&self, key: &str) -> Option<Vec<TokenRecord>> {
        let tokens = self.cache.get::<Vec<TokenRecord>>(key).await?;
        tracing::info!("Cache hit for {} ({} tokens)", key, tokens.len());
        Some(tokens)
    }

    async fn refresh(&self, key: &str) -> Result<Vec<TokenRecord>> {
        tracing::info!("Cache miss for {}, aggregating", key);
        let tokens = self.aggregator.aggregate().await?;
        self.cache.set(key, &tokens, None).await;
        Ok(tokens)
    }
}
