use std::sync::Once;
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, IntGauge, Opts, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Cache metrics
    pub static ref CACHE_HITS: Counter = Counter::new(
        "cache_hits_total",
        "Total number of cache hits"
    ).unwrap();

    pub static ref CACHE_MISSES: Counter = Counter::new(
        "cache_misses_total",
        "Total number of cache misses"
    ).unwrap();

    pub static ref CACHE_ERRORS: Counter = Counter::new(
        "cache_errors_total",
        "Cache backend failures degraded to a default"
    ).unwrap();

    // Upstream metrics
    pub static ref UPSTREAM_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("upstream_requests_total", "Requests issued to upstream providers"),
        &["upstream"]
    ).unwrap();

    pub static ref UPSTREAM_FAILURES: CounterVec = CounterVec::new(
        Opts::new("upstream_failures_total", "Failed upstream requests"),
        &["upstream"]
    ).unwrap();

    pub static ref UPSTREAM_RETRIES: Counter = Counter::new(
        "upstream_retries_total",
        "Retries scheduled by the backoff executor"
    ).unwrap();

    pub static ref RATE_LIMITER_WAITS: Counter = Counter::new(
        "rate_limiter_waits_total",
        "Times a caller was suspended waiting for a rate limit slot"
    ).unwrap();

    // Aggregation metrics
    pub static ref AGGREGATION_CYCLES: Counter = Counter::new(
        "aggregation_cycles_total",
        "Aggregation cycles run on cache miss"
    ).unwrap();

    pub static ref FALLBACK_SUBSTITUTIONS: Counter = Counter::new(
        "fallback_substitutions_total",
        "Aggregations answered with synthetic fallback data"
    ).unwrap();

    pub static ref AGGREGATION_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "aggregation_latency_seconds",
            "Aggregation cycle latency"
        ).buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 15.0, 60.0])
    ).unwrap();

    // Broadcast metrics
    pub static ref BROADCAST_TICKS: Counter = Counter::new(
        "broadcast_ticks_total",
        "Broadcast timer fires"
    ).unwrap();

    pub static ref BROADCAST_PUSHES: Counter = Counter::new(
        "broadcast_pushes_total",
        "Token pages pushed to subscribers"
    ).unwrap();

    pub static ref ACTIVE_SUBSCRIBERS: IntGauge = IntGauge::new(
        "active_subscribers",
        "Connections currently subscribed to token updates"
    ).unwrap();
}

static REGISTER: Once = Once::new();

pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY.register(Box::new(CACHE_HITS.clone())).unwrap();
        REGISTRY.register(Box::new(CACHE_MISSES.clone())).unwrap();
        REGISTRY.register(Box::new(CACHE_ERRORS.clone())).unwrap();
        REGISTRY.register(Box::new(UPSTREAM_REQUESTS.clone())).unwrap();
        REGISTRY.register(Box::new(UPSTREAM_FAILURES.clone())).unwrap();
        REGISTRY.register(Box::new(UPSTREAM_RETRIES.clone())).unwrap();
        REGISTRY.register(Box::new(RATE_LIMITER_WAITS.clone())).unwrap();
        REGISTRY.register(Box::new(AGGREGATION_CYCLES.clone())).unwrap();
        REGISTRY.register(Box::new(FALLBACK_SUBSTITUTIONS.clone())).unwrap();
        REGISTRY.register(Box::new(AGGREGATION_LATENCY.clone())).unwrap();
        REGISTRY.register(Box::new(BROADCAST_TICKS.clone())).unwrap();
        REGISTRY.register(Box::new(BROADCAST_PUSHES.clone())).unwrap();
        REGISTRY.register(Box::new(ACTIVE_SUBSCRIBERS.clone())).unwrap();
    });
}

/// Prometheus text exposition of everything in `REGISTRY`.
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}
