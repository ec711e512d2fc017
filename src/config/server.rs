use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            default_limit: 30,
            max_limit: 100,
        }
    }
}

impl PaginationConfig {
    /// Route-level bound; the service itself accepts any limit.
    pub fn clamp(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub interval_secs: u64,
    pub page_limit: i64,
    pub sort_by: String,
    pub sort_order: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        BroadcastConfig {
            interval_secs: 30,
            page_limit: 30,
            sort_by: "volume_sol".to_string(),
            sort_order: "desc".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamp() {
        let pagination = PaginationConfig::default();
        assert_eq!(pagination.clamp(None), 30);
        assert_eq!(pagination.clamp(Some(0)), 1);
        assert_eq!(pagination.clamp(Some(-5)), 1);
        assert_eq!(pagination.clamp(Some(10)), 10);
        assert_eq!(pagination.clamp(Some(10_000)), 100);
    }
}
