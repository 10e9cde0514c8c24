//! Bounded exponential-backoff retry around a [`Transport`](crate::transport::Transport) call.
//!
//! The same helper serves every call site; only the [`RetryPolicy`] differs.
//! Catalog listing runs with [`RetryPolicy::listing()`] (no retries, short
//! timeout) and content generation with [`RetryPolicy::generation()`].

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::transport::RawResponse;
use crate::Result;

/// Base backoff delay shared by both presets.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(800);

/// Retry and timeout settings for one call site.
///
/// ```rust
/// # use huginn::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::generation()
///     .retries(5)
///     .base_delay(Duration::from_millis(100));
/// assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first. 0 = single attempt.
    pub retries: u32,
    /// Wait before the first retry; doubles for each further retry.
    pub base_delay: Duration,
    /// Per-attempt wall-clock limit for response headers.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Catalog listing: one attempt, 15s timeout.
    pub fn listing() -> Self {
        Self {
            retries: 0,
            base_delay: DEFAULT_BASE_DELAY,
            timeout: Duration::from_secs(15),
        }
    }

    /// Content generation: up to 3 retries, 30s timeout per attempt.
    pub fn generation() -> Self {
        Self {
            retries: 3,
            base_delay: DEFAULT_BASE_DELAY,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn retries(mut self, n: u32) -> Self {
        self.retries = n;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait before attempt `attempt` (0-indexed): zero for the first
    /// attempt, then `base_delay * 2^(attempt - 1)`. Uncapped, no jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt - 1))
    }
}

/// Run `f` until it yields a terminal outcome.
///
/// Retryable statuses (429, 500, 502, 503, 504) and transport errors are
/// retried up to `policy.retries` times. Whatever the final attempt
/// produces is handed back unchanged: a retryable response is returned as
/// `Ok`, a transport error as `Err`.
pub async fn with_retry<F, Fut>(policy: &RetryPolicy, operation: &str, f: F) -> Result<RawResponse>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<RawResponse>>,
{
    let mut attempt = 0u32;
    loop {
        let delay = policy.delay_for_attempt(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = f().await;
        if attempt >= policy.retries {
            return result;
        }

        let reason = match &result {
            Ok(response) if response.is_retryable() => format!("HTTP {}", response.status),
            Err(e) if e.is_transient() => e.to_string(),
            _ => return result,
        };

        attempt += 1;
        metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation.to_owned())
            .increment(1);
        warn!(
            operation,
            attempt = attempt + 1,
            max_attempts = policy.retries + 1,
            delay_ms = policy.delay_for_attempt(attempt).as_millis() as u64,
            error = %reason,
            "retrying after transient failure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let listing = RetryPolicy::listing();
        assert_eq!(listing.retries, 0);
        assert_eq!(listing.timeout, Duration::from_secs(15));

        let generation = RetryPolicy::generation();
        assert_eq!(generation.retries, 3);
        assert_eq!(generation.timeout, Duration::from_secs(30));
        assert_eq!(generation.base_delay, Duration::from_millis(800));
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::generation();
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1600));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(3200));
    }

    #[test]
    fn backoff_is_not_capped() {
        let policy = RetryPolicy::generation();
        assert_eq!(policy.delay_for_attempt(8), Duration::from_millis(800 * 128));
    }
}
