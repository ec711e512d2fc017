pub mod aggregator;
pub mod backoff;
pub mod providers;
pub mod rate_limiter;

pub use aggregator::TokenAggregator;
pub use backoff::{ExponentialBackoff, RetryAll, RetryPolicy, RetryTransient};
pub use rate_limiter::SlidingWindowRateLimiter;
