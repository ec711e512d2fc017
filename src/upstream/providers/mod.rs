pub mod dexscreener;
pub mod fallback;
pub mod jupiter;

use std::collections::HashMap;
use async_trait::async_trait;
use crate::error::Result;
use crate::types::TokenRecord;
use crate::utils::helper::current_timestamp_ms;

/// Primary source: token search and single-token lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Tokens matching `query`. A provider that is blocking us yields an empty list.
    async fn search(&self, query: &str) -> Result<Vec<TokenRecord>>;

    /// `Ok(None)` when the upstream knows no pairs for `address`.
    async fn get_token_by_address(&self, address: &str) -> Result<Option<TokenRecord>>;
}

/// Secondary source: spot prices keyed by token address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn get_prices(&self, ids: &[String]) -> Result<HashMap<String, f64>>;
}

/// Replace prices with positive enrichment prices where available.
///
/// Best effort: if the price lookup fails the input comes back unchanged.
/// Only the first `max_ids` addresses are looked up.
pub async fn enrich_token_data(
    provider: &dyn PriceProvider,
    tokens: Vec<TokenRecord>,
    max_ids: usize,
) -> Vec<TokenRecord> {
    let ids: Vec<String> = tokens.iter()
        .take(max_ids)
        .map(|t| t.token_address.clone())
        .collect();

    if ids.is_empty() {
        return tokens;
    }

    match provider.get_prices(&ids).await {
        Ok(prices) => {
            let now = current_timestamp_ms();
            tokens.into_iter()
                .map(|token| match prices.get(&token.token_address) {
                    Some(&price) if price > 0.0 => token.with_price(price, now),
                    _ => token,
                })
                .collect()
        }
        Err(e) => {
            tracing::warn!("Failed to enrich with secondary prices, using original data: {}", e);
            tokens
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn token(address: &str, price: f64) -> TokenRecord {
        TokenRecord {
            price_sol: price,
            ..TokenRecord::new(address)
        }
    }

    #[tokio::test]
    async fn replaces_only_positive_prices() {
        let mut provider = MockPriceProvider::new();
        provider.expect_get_prices().times(1).returning(|_| {
            Ok(HashMap::from([
                ("a".to_string(), 2.5),
                ("b".to_string(), 0.0),
            ]))
        });

        let enriched = enrich_token_data(
            &provider,
            vec![token("a", 1.0), token("b", 1.0), token("c", 1.0)],
            100,
        )
        .await;

        assert_eq!(enriched[0].price_sol, 2.5);
        assert!(enriched[0].last_updated > 0);
        assert_eq!(enriched[1].price_sol, 1.0);
        assert_eq!(enriched[2].price_sol, 1.0);
    }

    #[tokio::test]
    async fn failure_returns_the_input_unchanged() {
        let mut provider = MockPriceProvider::new();
        provider.expect_get_prices().returning(|_| {
            Err(Error::UpstreamTimeout { upstream: "jupiter".to_string() })
        });

        let input = vec![token("a", 1.0), token("b", 3.0)];
        let enriched = enrich_token_data(&provider, input.clone(), 100).await;

        assert_eq!(enriched, input);
    }

    #[tokio::test]
    async fn looks_up_at_most_max_ids() {
        let mut provider = MockPriceProvider::new();
        provider.expect_get_prices()
            .withf(|ids: &[String]| ids.len() == 2 && ids[0] == "t0" && ids[1] == "t1")
            .times(1)
            .returning(|_| Ok(HashMap::new()));

        let input: Vec<_> = (0..5).map(|i| token(&format!("t{}", i), 1.0)).collect();
        let enriched = enrich_token_data(&provider, input, 2).await;

        assert_eq!(enriched.len(), 5);
    }

    #[tokio::test]
    async fn empty_input_skips_the_lookup() {
        let mut provider = MockPriceProvider::new();
        provider.expect_get_prices().times(0);

        assert!(enrich_token_data(&provider, vec![], 100).await.is_empty());
    }
}
