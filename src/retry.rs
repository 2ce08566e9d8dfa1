//! Bounded retry with exponential backoff for rate-limited requests
//!
//! Backoff is scoped to HTTP 429 responses only: retrying a rate limit
//! avoids hammering the endpoint, while genuine errors (auth, malformed
//! payload) surface immediately instead of hiding behind retries.

use std::time::Duration;

use crate::{Error, Result};

/// Retry policy for the transcription request
///
/// Controls the warm-up delay before the first attempt, how many times a
/// rate-limited request is retried, and how long to wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Delay before the first attempt, mitigates an upstream cold-start
    /// rate-limit issue
    pub warmup: Duration,
    /// Base delay, doubled per attempt: `base * 2^attempt`
    pub backoff_base: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            warmup: Duration::from_millis(500),
            backoff_base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Whether an HTTP status is a rate limit worth retrying
///
/// 429 is the only distinguished status; everything else is terminal for
/// the current cycle.
#[must_use]
pub const fn is_rate_limited(status: u16) -> bool {
    status == 429
}

/// Compute the delay before the next attempt
///
/// With the default 1s base, attempt 1 waits 2s and attempt 2 waits 4s.
/// The result is capped at `policy.max_delay`.
#[must_use]
pub fn backoff_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    policy
        .backoff_base
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(policy.max_delay)
}

/// Run `op` under the policy, retrying only on rate limits
///
/// Waits the warm-up delay once, then invokes `op` with the attempt number
/// (starting at 1) up to `max_attempts` times, sleeping the backoff between
/// rate-limited attempts. Any error other than [`Error::RateLimited`]
/// returns immediately; exhausting the budget returns `RateLimited` with
/// the number of attempts made.
///
/// # Errors
///
/// Returns the terminal error from `op`, or `RateLimited` on exhaustion.
pub async fn retry_rate_limited<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    tokio::time::sleep(policy.warmup).await;

    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(Error::RateLimited { .. }) if attempt < policy.max_attempts => {
                let delay = backoff_for_attempt(policy, attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(Error::RateLimited { .. }) => {
                tracing::warn!(attempts = attempt, "rate limit retry budget exhausted");
                return Err(Error::RateLimited { attempts: attempt });
            }
            Err(e) => return Err(e),
        }
    }
}
