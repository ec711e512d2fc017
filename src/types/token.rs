use serde::{Deserialize, Serialize};

/// Canonical market record for one token, keyed by `token_address`.
///
/// Numeric fields default to zero when the upstream omits them, and records
/// are replaced wholesale rather than edited in place once merged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token_address: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_ticker: String,
    #[serde(default)]
    pub price_sol: f64,
    #[serde(default)]
    pub market_cap_sol: f64,
    #[serde(default)]
    pub volume_sol: f64,
    #[serde(default)]
    pub liquidity_sol: f64,
    #[serde(default)]
    pub transaction_count: u64,
    #[serde(default)]
    pub price_1hr_change: f64,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub last_updated: u64,
}

impl TokenRecord {
    pub fn new(token_address: impl Into<String>) -> Self {
        TokenRecord {
            token_address: token_address.into(),
            token_name: String::new(),
            token_ticker: String::new(),
            price_sol: 0.0,
            market_cap_sol: 0.0,
            volume_sol: 0.0,
            liquidity_sol: 0.0,
            transaction_count: 0,
            price_1hr_change: 0.0,
            protocol: String::new(),
            last_updated: 0,
        }
    }

    /// Copy of this record with a new price, stamped at `now_ms`.
    pub fn with_price(&self, price_sol: f64, now_ms: u64) -> Self {
        TokenRecord {
            price_sol,
            last_updated: now_ms.max(self.last_updated),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_numeric_fields_default_to_zero() {
        let record: TokenRecord = serde_json::from_str(
            r#"{"token_address":"abc","token_name":"A","token_ticker":"A"}"#,
        )
        .unwrap();

        assert_eq!(record.price_sol, 0.0);
        assert_eq!(record.volume_sol, 0.0);
        assert_eq!(record.transaction_count, 0);
        assert_eq!(record.last_updated, 0);
    }

    #[test]
    fn with_price_never_moves_last_updated_backwards() {
        let mut record = TokenRecord::new("abc");
        record.last_updated = 2_000;

        let repriced = record.with_price(1.5, 1_000);
        assert_eq!(repriced.price_sol, 1.5);
        assert_eq!(repriced.last_updated, 2_000);

        let repriced = record.with_price(2.0, 3_000);
        assert_eq!(repriced.last_updated, 3_000);
        assert_eq!(repriced.token_address, "abc");
    }
}
