use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use rand::Rng;
use tokio::time::{sleep, Duration};
use crate::config::BackoffConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::UPSTREAM_RETRIES;

/// Decides whether a failed attempt is worth another try.
pub trait RetryPolicy: Send + Sync {
    fn should_retry(&self, error: &Error) -> bool;
}

/// Retries every failure, including ones a retry cannot fix.
pub struct RetryAll;

impl RetryPolicy for RetryAll {
    fn should_retry(&self, _error: &Error) -> bool {
        true
    }
}

/// Retries only timeouts, transport errors, 5xx and 429.
pub struct RetryTransient;

impl RetryPolicy for RetryTransient {
    fn should_retry(&self, error: &Error) -> bool {
        error.is_transient()
    }
}

const JITTER_RATIO: f64 = 0.3;

/// Retries an async operation with exponentially growing, jittered delays.
///
/// The attempt counter belongs to the instance, not to one `execute` call:
/// it is zeroed by any success and by giving up.
pub struct ExponentialBackoff {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    attempts: AtomicU32,
    policy: Arc<dyn RetryPolicy>,
}

impl ExponentialBackoff {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        ExponentialBackoff {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            attempts: AtomicU32::new(0),
            policy: Arc::new(RetryAll),
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        let backoff = Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        );

        if config.strict {
            backoff.with_policy(Arc::new(RetryTransient))
        } else {
            backoff
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub async fn execute<T, F, Fut>(&self, mut operation: F, label: &str) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            match operation().await {
                Ok(value) => {
                    self.attempts.store(0, Ordering::SeqCst);
                    return Ok(value);
                }
                Err(e) => {
                    let attempts = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

                    if attempts >= self.max_attempts {
                        tracing::error!(
                            "Max retry attempts ({}) reached for {}: {}",
                            self.max_attempts, label, e
                        );
                        self.attempts.store(0, Ordering::SeqCst);
                        return Err(e);
                    }

                    if !self.policy.should_retry(&e) {
                        tracing::error!("Not retrying {} after non-retryable failure: {}", label, e);
                        self.attempts.store(0, Ordering::SeqCst);
                        return Err(e);
                    }

                    let delay = self.jittered_delay(attempts);
                    UPSTREAM_RETRIES.inc();
                    tracing::warn!(
                        "Retry attempt {}/{} for {}, waiting {}ms: {}",
                        attempts, self.max_attempts, label, delay.as_millis(), e
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// `min(base * 2^(attempts-1), max)`, before jitter.
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jittered_delay(&self, attempts: u32) -> Duration {
        let delay = self.delay_for(attempts);
        let jitter = rand::thread_rng().gen_range(0.0..=JITTER_RATIO);
        delay + delay.mul_f64(jitter)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.attempts.store(0, Ordering::SeqCst);
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::from_config(&BackoffConfig::default())
    }
}
