use rand::Rng;
use rand::distributions::Alphanumeric;
use crate::types::TokenRecord;
use crate::utils::helper::current_timestamp_ms;

pub const DEFAULT_FALLBACK_SIZE: usize = 50;

const PROTOCOLS: [&str; 3] = ["Raydium", "Orca", "Serum"];

fn seed_tokens(now_ms: u64) -> Vec<TokenRecord> {
    let seed = |address: &str, name: &str, ticker: &str, price, market_cap, volume, liquidity, txns, change, protocol: &str| {
        TokenRecord {
            token_address: address.to_string(),
            token_name: name.to_string(),
            token_ticker: ticker.to_string(),
            price_sol: price,
            market_cap_sol: market_cap,
            volume_sol: volume,
            liquidity_sol: liquidity,
            transaction_count: txns,
            price_1hr_change: change,
            protocol: protocol.to_string(),
            last_updated: now_ms,
        }
    };

    vec![
        seed("So11111111111111111111111111111111111111112", "Wrapped SOL", "SOL",
            1.0, 1_000_000.0, 50_000.0, 100_000.0, 5_000, 2.5, "Raydium"),
        seed("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USD Coin", "USDC",
            0.0045, 500_000.0, 30_000.0, 80_000.0, 3_000, 0.1, "Orca"),
        seed("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT", "USDT",
            0.0044, 450_000.0, 28_000.0, 75_000.0, 2_800, -0.2, "Raydium"),
    ]
}

/// Synthetic market data served when the primary provider has nothing usable.
///
/// Exactly `count` records with unique addresses: three well-known tokens
/// followed by generated `Mock…` entries with random figures.
pub fn fallback_tokens(count: usize) -> Vec<TokenRecord> {
    let now = current_timestamp_ms();
    let mut rng = rand::thread_rng();

    let mut tokens = seed_tokens(now);
    tokens.truncate(count);

    for i in tokens.len()..count {
        let suffix: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();

        tokens.push(TokenRecord {
            token_address: format!("Mock{}{}", suffix, i),
            token_name: format!("Mock Token {}", i + 1),
            token_ticker: format!("MOCK{}", i + 1),
            price_sol: rng.gen_range(0.0..0.01),
            market_cap_sol: rng.gen_range(0.0..100_000.0),
            volume_sol: rng.gen_range(0.0..10_000.0),
            liquidity_sol: rng.gen_range(0.0..20_000.0),
            transaction_count: rng.gen_range(0..1_000),
            price_1hr_change: rng.gen_range(-10.0..10.0),
            protocol: PROTOCOLS[rng.gen_range(0..PROTOCOLS.len())].to_string(),
            last_updated: now,
        });
    }

    tokens
}
