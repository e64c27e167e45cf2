//! Rate-limit detection and exponential backoff

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;

/// Status codes that signal overload: Too Many Requests, Service
/// Unavailable, Bandwidth Limit Exceeded
pub const BACKOFF_STATUS_CODES: [u16; 3] = [429, 503, 509];

/// Upper bound of the jitter added on top of a backoff delay, as a fraction
pub const MAX_JITTER_FRACTION: f64 = 0.1;

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Ceiling for the exponential term
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(60),
        }
    }
}

/// Returns true if the status code asks the client to slow down
pub fn should_backoff(status_code: u16) -> bool {
    BACKOFF_STATUS_CODES.contains(&status_code)
}

/// Computes the delay before retry number `attempt` (0-indexed)
///
/// `min(base * 2^attempt, cap)` plus up to 10% uniform jitter.
pub fn backoff_delay(attempt: u32, policy: &BackoffPolicy) -> Duration {
    let jitter = rand::rng().random_range(0.0..=MAX_JITTER_FRACTION);
    backoff_delay_with_jitter(attempt, policy, jitter)
}

/// Deterministic core of [`backoff_delay`] with an explicit jitter fraction
///
/// `jitter` is clamped to `[0, MAX_JITTER_FRACTION]`.
pub fn backoff_delay_with_jitter(attempt: u32, policy: &BackoffPolicy, jitter: f64) -> Duration {
    let base = policy.base.as_secs_f64();
    let cap = policy.cap.as_secs_f64();
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);

    let delay = (base * 2f64.powi(exponent)).min(cap);
    let jitter = jitter.clamp(0.0, MAX_JITTER_FRACTION);

    Duration::from_secs_f64(delay + delay * jitter)
}

/// Reads a delta-seconds `Retry-After` header
///
/// HTTP-date values are not interpreted and yield `None`.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
