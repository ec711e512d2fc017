use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use crate::config::server::LogFormat;

/// Install the global subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {}", e);
    }
}

pub fn trace_aggregation_cycle() -> Span {
    tracing::info_span!("aggregation_cycle")
}

pub fn trace_upstream_request(upstream: &str, label: &str) -> Span {
    tracing::info_span!(
        "upstream_request",
        upstream = %upstream,
        label = %label,
    )
}
