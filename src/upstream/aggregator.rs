use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use crate::error::Result;
use crate::observability::metrics::{AGGREGATION_CYCLES, AGGREGATION_LATENCY, FALLBACK_SUBSTITUTIONS};
use crate::observability::tracing::trace_aggregation_cycle;
use crate::types::TokenRecord;
use crate::upstream::providers::fallback::{fallback_tokens, DEFAULT_FALLBACK_SIZE};
use crate::upstream::providers::{enrich_token_data, ListingProvider, PriceProvider};

pub const DEFAULT_SEARCH_QUERY: &str = "solana";
pub const DEFAULT_ENRICHMENT_CAP: usize = 100;

/// Builds one de-duplicated token set from the primary and secondary sources.
pub struct TokenAggregator {
    listing: Arc<dyn ListingProvider>,
    prices: Arc<dyn PriceProvider>,
    search_query: String,
    fallback_size: usize,
    enrichment_cap: usize,
}

impl TokenAggregator {
    pub fn new(listing: Arc<dyn ListingProvider>, prices: Arc<dyn PriceProvider>) -> Self {
        TokenAggregator {
            listing,
            prices,
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            fallback_size: DEFAULT_FALLBACK_SIZE,
            enrichment_cap: DEFAULT_ENRICHMENT_CAP,
        }
    }

    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_fallback_size(mut self, size: usize) -> Self {
        self.fallback_size = size;
        self
    }

    pub fn with_enrichment_cap(mut self, cap: usize) -> Self {
        self.enrichment_cap = cap;
        self
    }

    pub async fn aggregate(&self) -> Result<Vec<TokenRecord>> {
        let start = Instant::now();
        AGGREGATION_CYCLES.inc();

        let tokens = self.run_cycle().instrument(trace_aggregation_cycle()).await;

        AGGREGATION_LATENCY.observe(start.elapsed().as_secs_f64());
        Ok(tokens)
    }

    async fn run_cycle(&self) -> Vec<TokenRecord> {
        // Step 1: Primary search; a failed search is treated like an empty one
        let listed = match self.listing.search(&self.search_query).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::error!("Primary provider failed after retries: {}", e);
                Vec::new()
            }
        };

        if listed.is_empty() {
            tracing::warn!("No tokens from primary provider, using {} fallback tokens", self.fallback_size);
            FALLBACK_SUBSTITUTIONS.inc();
            return fallback_tokens(self.fallback_size);
        }
        tracing::info!("Fetched {} tokens from primary provider", listed.len());

        // Step 2: Enrich prices, keeping primary prices on failure
        let enriched = enrich_token_data(self.prices.as_ref(), listed, self.enrichment_cap).await;

        // Step 3: Merge duplicates
        let merged = merge_by_address(enriched);
        tracing::info!("Aggregated {} unique tokens", merged.len());
        merged
    }
}

/// One record per address; on collision the higher 24h volume wins and ties
/// keep the record seen first. Output follows first-seen address order.
pub fn merge_by_address(tokens: Vec<TokenRecord>) -> Vec<TokenRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(tokens.len());
    let mut merged: Vec<TokenRecord> = Vec::with_capacity(tokens.len());

    for token in tokens {
        match index.get(&token.token_address) {
            Some(&slot) => {
                if token.volume_sol > merged[slot].volume_sol {
                    merged[slot] = token;
                }
            }
            None => {
                index.insert(token.token_address.clone(), merged.len());
                merged.push(token);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::upstream::providers::{MockListingProvider, MockPriceProvider};

    fn token(address: &str, volume: f64) -> TokenRecord {
        TokenRecord {
            volume_sol: volume,
            price_sol: 1.0,
            ..TokenRecord::new(address)
        }
    }

    fn aggregator(listing: MockListingProvider, prices: MockPriceProvider) -> TokenAggregator {
        TokenAggregator::new(Arc::new(listing), Arc::new(prices))
    }

    #[test]
    fn merge_keeps_the_most_active_record() {
        let merged = merge_by_address(vec![
            token("a", 10.0),
            token("b", 5.0),
            token("a", 30.0),
            token("a", 20.0),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].token_address, "a");
        assert_eq!(merged[0].volume_sol, 30.0);
        assert_eq!(merged[1].token_address, "b");
    }

    #[test]
    fn merge_ties_keep_exactly_one() {
        let mut first = token("a", 10.0);
        first.token_name = "first".to_string();
        let mut second = token("a", 10.0);
        second.token_name = "second".to_string();

        let merged = merge_by_address(vec![first, second]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].token_name, "first");
    }

    #[tokio::test]
    async fn empty_primary_result_yields_the_fallback_set() {
        let mut listing = MockListingProvider::new();
        listing.expect_search().times(1).returning(|_| Ok(vec![]));
        let mut prices = MockPriceProvider::new();
        prices.expect_get_prices().times(0);

        let tokens = aggregator(listing, prices).aggregate().await.unwrap();
        assert_eq!(tokens.len(), DEFAULT_FALLBACK_SIZE);
    }

    #[tokio::test]
    async fn failing_primary_yields_the_fallback_set() {
        let mut listing = MockListingProvider::new();
        listing.expect_search().returning(|_| {
            Err(Error::RateLimited { upstream: "dexscreener".to_string() })
        });
        let prices = MockPriceProvider::new();

        let tokens = aggregator(listing, prices)
            .with_fallback_size(10)
            .aggregate()
            .await
            .unwrap();
        assert_eq!(tokens.len(), 10);
    }

    #[tokio::test]
    async fn enriches_then_deduplicates() {
        let mut listing = MockListingProvider::new();
        listing.expect_search()
            .withf(|q: &str| q == "solana")
            .returning(|_| Ok(vec![token("a", 1.0), token("b", 2.0), token("a", 3.0)]));

        let mut prices = MockPriceProvider::new();
        prices.expect_get_prices()
            .returning(|_| Ok(HashMap::from([("b".to_string(), 9.0)])));

        let tokens = aggregator(listing, prices).aggregate().await.unwrap();
        assert_eq!(tokens.len(), 2);

        let a = tokens.iter().find(|t| t.token_address == "a").unwrap();
        assert_eq!(a.volume_sol, 3.0);
        let b = tokens.iter().find(|t| t.token_address == "b").unwrap();
        assert_eq!(b.price_sol, 9.0);
    }

    #[tokio::test]
    async fn enrichment_failure_keeps_primary_data() {
        let mut listing = MockListingProvider::new();
        listing.expect_search().returning(|_| Ok(vec![token("a", 1.0)]));

        let mut prices = MockPriceProvider::new();
        prices.expect_get_prices().returning(|_| {
            Err(Error::UpstreamTimeout { upstream: "jupiter".to_string() })
        });

        let tokens = aggregator(listing, prices).aggregate().await.unwrap();
        assert_eq!(tokens, vec![token("a", 1.0)]);
    }
}
