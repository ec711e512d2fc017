mod common;

use common::*;
use serde_json::json;
use token_feed::config::upstream::{DexScreenerConfig, JupiterConfig};
use token_feed::error::Error;
use token_feed::upstream::providers::dexscreener::DexScreenerProvider;
use token_feed::upstream::providers::jupiter::JupiterProvider;
use token_feed::upstream::providers::{ListingProvider, PriceProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dexscreener(server: &MockServer, max_attempts: u32) -> DexScreenerProvider {
    let config = DexScreenerConfig {
        base_url: server.uri(),
        ..Default::default()
    };
    DexScreenerProvider::new(config, fast_backoff(max_attempts)).unwrap()
}

fn jupiter(server: &MockServer, max_attempts: u32) -> JupiterProvider {
    let config = JupiterConfig {
        base_url: format!("{}/price", server.uri()),
        ..Default::default()
    };
    JupiterProvider::new(config, fast_backoff(max_attempts)).unwrap()
}

#[tokio::test]
async fn search_keeps_only_the_target_chain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "solana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pairs_body(vec![
            pair("solana", BONK, "BONK", 1000.0, 40.0),
            pair("ethereum", "0xdeadbeef", "PEPE", 5000.0, 10.0),
            pair("solana", WIF, "WIF", 300.0, 12.0),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = dexscreener(&server, 3).search("solana").await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token_address, BONK);
    assert_eq!(tokens[0].price_sol, 0.5);
    // 1000 USD volume at 2 USD per unit
    assert_eq!(tokens[0].volume_sol, 500.0);
    assert_eq!(tokens[0].market_cap_sol, 500.0);
    assert_eq!(tokens[0].liquidity_sol, 40.0);
    assert_eq!(tokens[0].transaction_count, 7);
    assert_eq!(tokens[1].token_address, WIF);
}

#[tokio::test]
async fn one_malformed_pair_does_not_discard_the_search() {
    let server = MockServer::start().await;
    let mut unnamed = pair("solana", WIF, "WIF", 300.0, 12.0);
    unnamed["baseToken"]["name"] = serde_json::Value::Null;
    unnamed["baseToken"]["symbol"] = serde_json::Value::Null;
    let broken = json!({"chainId": "solana", "baseToken": 5});

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pairs_body(vec![
            pair("solana", BONK, "BONK", 1000.0, 40.0),
            unnamed,
            broken,
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = dexscreener(&server, 3).search("solana").await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].token_address, BONK);
    assert_eq!(tokens[1].token_address, WIF);
    assert_eq!(tokens[1].token_name, "");
}

#[tokio::test]
async fn rate_limited_search_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pairs_body(vec![
            pair("solana", BONK, "BONK", 10.0, 1.0),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = dexscreener(&server, 5);
    let tokens = provider.search("solana").await.unwrap();

    assert_eq!(tokens.len(), 1);
    assert_eq!(provider.backoff().attempts(), 0);
}

#[tokio::test]
async fn blocked_search_is_empty_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = dexscreener(&server, 5).search("solana").await.unwrap();
    assert!(tokens.is_empty());
}

#[tokio::test]
async fn persistent_server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&server)
        .await;

    let provider = dexscreener(&server, 3);
    let err = provider.search("solana").await.unwrap_err();

    assert!(matches!(err, Error::UpstreamStatus { status: 502, .. }));
    assert_eq!(provider.backoff().attempts(), 0);
}

#[tokio::test]
async fn single_token_lookup_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/tokens/{}", BONK)))
        .respond_with(ResponseTemplate::new(200).set_body_json(pairs_body(vec![
            pair("solana", BONK, "BONK", 10.0, 1.0),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/tokens/{}", WIF)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "pairs": null })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/tokens/{}", SOL)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let provider = dexscreener(&server, 3);

    let found = provider.get_token_by_address(BONK).await.unwrap();
    assert_eq!(found.map(|t| t.token_ticker), Some("BONK".to_string()));
    assert_eq!(provider.get_token_by_address(WIF).await.unwrap(), None);
    assert_eq!(provider.get_token_by_address(SOL).await.unwrap(), None);
}

#[tokio::test]
async fn jupiter_prices_for_requested_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price"))
        .and(query_param("ids", format!("{},{}", BONK, WIF)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                BONK: {"id": BONK, "mintSymbol": "BONK", "price": 0.25},
                WIF: {"id": WIF, "mintSymbol": "WIF", "price": "1.75"}
            },
            "timeTaken": 0.002
        })))
        .expect(1)
        .mount(&server)
        .await;

    let prices = jupiter(&server, 3)
        .get_prices(&[BONK.to_string(), WIF.to_string()])
        .await
        .unwrap();

    assert_eq!(prices.len(), 2);
    assert_eq!(prices[BONK], 0.25);
    assert_eq!(prices[WIF], 1.75);
}

#[tokio::test]
async fn jupiter_without_ids_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(jupiter(&server, 3).get_prices(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn jupiter_rate_limit_surfaces_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let err = jupiter(&server, 2)
        .get_prices(&[BONK.to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimited { .. }));
}
