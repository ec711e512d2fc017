use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};
use crate::observability::metrics::RATE_LIMITER_WAITS;

/// Sliding-window limiter keyed by upstream name.
///
/// Each key keeps the instants of its attempts inside the trailing window.
/// Stale instants are pruned lazily when the key is next acquired. Waiters
/// are not queued: every caller that wakes re-checks the window and may
/// suspend again.
pub struct SlidingWindowRateLimiter {
    max_requests: usize,
    window: Duration,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        SlidingWindowRateLimiter {
            max_requests: max_requests.max(1),
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Suspend until `key` has a free slot, then record the attempt.
    pub async fn acquire(&self, key: &str) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                let timestamps = windows.entry(key.to_string()).or_default();

                // Remove old timestamps
                while let Some(&front) = timestamps.front() {
                    if now.duration_since(front) >= self.window {
                        timestamps.pop_front();
                    } else {
                        break;
                    }
                }

                match timestamps.front() {
                    Some(&oldest) if timestamps.len() >= self.max_requests => {
                        (oldest + self.window).saturating_duration_since(now)
                    }
                    _ => {
                        timestamps.push_back(now);
                        return;
                    }
                }
            };

            RATE_LIMITER_WAITS.inc();
            tracing::warn!("Rate limit reached for {}, waiting {}ms", key, wait.as_millis());
            sleep(wait).await;
        }
    }

    /// Forget the window of one key, or of every key.
    pub async fn reset(&self, key: Option<&str>) {
        let mut windows = self.windows.lock().await;
        match key {
            Some(key) => {
                windows.remove(key);
            }
            None => windows.clear(),
        }
    }

    /// Attempts currently recorded for `key` (including not yet pruned ones).
    pub async fn recorded(&self, key: &str) -> usize {
        self.windows.lock().await.get(key).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn requests_under_the_limit_do_not_wait() {
        let limiter = SlidingWindowRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire("dexscreener").await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.recorded("dexscreener").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn the_request_over_the_limit_waits_for_the_oldest_to_expire() {
        let limiter = SlidingWindowRateLimiter::new(2, Duration::from_millis(1_000));
        let start = Instant::now();

        limiter.acquire("dexscreener").await;
        tokio::time::advance(Duration::from_millis(200)).await;
        limiter.acquire("dexscreener").await;
        limiter.acquire("dexscreener").await;

        let elapsed = start.elapsed();
        assert!(elapsed > Duration::from_millis(200));
        assert!(elapsed >= Duration::from_millis(1_000));
        // first attempt pruned, second and third retained
        assert_eq!(limiter.recorded("dexscreener").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_have_independent_windows() {
        let limiter = SlidingWindowRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        limiter.acquire("dexscreener").await;
        limiter.acquire("jupiter").await;

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_frees_the_window() {
        let limiter = SlidingWindowRateLimiter::new(1, Duration::from_secs(60));
        limiter.acquire("dexscreener").await;
        limiter.reset(Some("dexscreener")).await;

        let start = Instant::now();
        limiter.acquire("dexscreener").await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire("jupiter").await;
        limiter.reset(None).await;
        assert_eq!(limiter.recorded("dexscreener").await, 0);
        assert_eq!(limiter.recorded("jupiter").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_waiters_each_get_a_slot_eventually() {
        let limiter = std::sync::Arc::new(SlidingWindowRateLimiter::new(1, Duration::from_millis(100)));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire("dexscreener").await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // three slots of one per 100ms need at least two full windows
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
