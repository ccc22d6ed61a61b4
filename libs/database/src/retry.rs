//! Startup retry with exponential backoff.
//!
//! Only connection establishment is retried. Queries are never retried
//! automatically; their failures go straight back to the caller.

use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Backoff schedule for store connections.
///
/// The delay doubles after every failed attempt, starting at
/// `initial_delay` and never exceeding `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Scale each delay into `[50%, 100%)` of its nominal value
    pub jitter: bool,
}

impl RetryConfig {
    /// 3 retries starting at 100ms, capped at 5s, jittered.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Nominal delay before retry `attempt` (1-based), before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    fn sleep_before(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        if self.jitter { jittered(delay) } else { delay }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

/// Run `operation` until it succeeds or `config.max_retries` retries have
/// failed, returning the last error in that case.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut failures = 0;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if failures > 0 {
                    debug!(failures, "Connected after retrying");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        failures += 1;
        if failures > config.max_retries {
            warn!(attempts = failures, error = %error, "Giving up on store connection");
            return Err(error);
        }

        let delay = config.sleep_before(failures);
        warn!(
            attempt = failures,
            max_retries = config.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Store connection failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Retry with [`RetryConfig::default`].
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

fn jittered(delay: Duration) -> Duration {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let permille = RandomState::new().hash_one(Instant::now()) % 500;
    delay.mul_f64(0.5 + permille as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig::new()
            .with_initial_delay(Duration::from_millis(5))
            .without_jitter()
    }

    #[tokio::test]
    async fn test_first_success_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry(|| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("connected")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        n if n < 2 => Err(format!("server selection timeout #{}", n + 1)),
                        _ => Ok("connected"),
                    }
                }
            },
            fast(),
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_last_error_after_retries_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>("connection refused")
                }
            },
            fast().with_max_retries(2),
        )
        .await;

        assert_eq!(result.unwrap_err(), "connection refused");
        // first attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let config = RetryConfig {
            max_delay: Duration::from_millis(500),
            ..fast().with_initial_delay(Duration::from_millis(100))
        };

        let delays: Vec<u128> = (1..=5)
            .map(|attempt| config.delay_for_attempt(attempt).as_millis())
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
        assert_eq!(config.delay_for_attempt(200), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_half_to_full_delay() {
        let nominal = Duration::from_millis(1000);
        for _ in 0..20 {
            let delay = jittered(nominal);
            assert!(delay >= nominal / 2 && delay < nominal, "{delay:?}");
        }
    }
}
