//! Retry loop with pure exponential backoff.
//!
//! The schedule is `base * 2^(attempt-1)` slept *between* attempts, never
//! before the first: with the default 1s base that is 1s, 2s, 4s, ... The
//! total number of attempts (including the first) is bounded by
//! `max_attempts`.

use std::time::Duration;

use super::error::FetchError;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy. `attempt` is 1-based everywhere.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles each attempt after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff decision after `attempt` has failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        RetryDecision::RetryAfter(self.base_delay.saturating_mul(exp))
    }
}

/// Runs `f` until it succeeds, the policy says stop, or a non-retryable
/// error occurs. On retryable failure, sleeps for the backoff duration then
/// tries again; the last observed error is returned on exhaustion.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => match policy.decide(attempt) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    tracing::warn!(
                        attempt,
                        max = policy.max_attempts,
                        delay_ms = d.as_millis() as u64,
                        error = %e,
                        "fetch attempt failed, backing off"
                    );
                    std::thread::sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
