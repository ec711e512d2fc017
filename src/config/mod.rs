use serde::{Deserialize, Serialize};

pub mod cache;
pub mod server;
pub mod upstream;
pub mod loader;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Retry only transient failures instead of every failure
    pub strict: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            max_attempts: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            strict: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub size: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig { size: 50 }
    }
}
