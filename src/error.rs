use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Upstream Errors
    #[error("Rate limit exceeded for {upstream}")]
    RateLimited {
        upstream: String,
    },

    #[error("{upstream} is blocking requests (HTTP 403)")]
    UpstreamBlocked {
        upstream: String,
    },

    #[error("{upstream} returned HTTP {status}: {body}")]
    UpstreamStatus {
        upstream: String,
        status: u16,
        body: String,
    },

    #[error("{upstream} request timed out")]
    UpstreamTimeout {
        upstream: String,
    },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    #[error("Token aggregation failed: {0}")]
    AggregationFailed(String),

    // Cache Errors
    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // Request Errors
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Failures that a later attempt against the same upstream may not repeat:
    /// timeouts, transport errors, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::RateLimited { .. } | Error::UpstreamTimeout { .. } => true,
            Error::UpstreamStatus { status, .. } => *status >= 500,
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::CacheError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_and_server_errors_are_transient() {
        assert!(Error::RateLimited { upstream: "dexscreener".into() }.is_transient());
        assert!(Error::UpstreamTimeout { upstream: "jupiter".into() }.is_transient());
        assert!(Error::UpstreamStatus {
            upstream: "dexscreener".into(),
            status: 502,
            body: String::new(),
        }
        .is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!Error::UpstreamStatus {
            upstream: "dexscreener".into(),
            status: 400,
            body: "bad".into(),
        }
        .is_transient());
        assert!(!Error::DeserializationError("eof".into()).is_transient());
        assert!(!Error::UpstreamBlocked { upstream: "dexscreener".into() }.is_transient());
    }
}
