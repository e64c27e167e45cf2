//! Ethics gate: robots.txt compliance and request pacing
//!
//! This module decides whether a scan may proceed and enforces politeness:
//! - robots.txt evaluation for the scanner's product token
//! - Crawl-delay honoring, bounded by [`MAX_CRAWL_DELAY`]
//! - A randomized delay before the page fetch
//! - Exponential backoff on rate-limit signals
//!
//! # Fail-open policy
//!
//! When robots.txt cannot be fetched (network error, timeout, unreadable
//! body) the gate ALLOWS the scan and logs the fallback at warn level. A
//! robots.txt that answers 401, 403 or a server error is not a read failure:
//! it disallows the scan.

mod backoff;
mod delay;

pub use backoff::{
    backoff_delay, backoff_delay_with_jitter, retry_after, should_backoff, BackoffPolicy,
    BACKOFF_STATUS_CODES, MAX_JITTER_FRACTION,
};
pub use delay::{sample_delay, triangular, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};

use crate::cancel::{cancellable, sleep_or_cancel};
use crate::robots::{fetch_robots, is_allowed, ParsedRobots};
use crate::ScanError;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Longest Crawl-delay the gate will wait
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Caps a site-requested Crawl-delay at [`MAX_CRAWL_DELAY`]
pub fn bounded_crawl_delay(crawl_delay: Duration) -> Duration {
    if crawl_delay > MAX_CRAWL_DELAY {
        tracing::warn!(
            "Crawl-delay of {:?} exceeds the {:?} limit, waiting {:?}",
            crawl_delay,
            MAX_CRAWL_DELAY,
            MAX_CRAWL_DELAY
        );
        return MAX_CRAWL_DELAY;
    }
    crawl_delay
}

/// Pacing parameters for one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politeness {
    /// Lower bound of the randomized pre-fetch delay
    pub min_delay: Duration,
    /// Upper bound of the randomized pre-fetch delay
    pub max_delay: Duration,
    /// Backoff applied on 429/503/509
    pub backoff: BackoffPolicy,
}

impl Default for Politeness {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl Politeness {
    /// No pre-fetch delay; backoff keeps its default shape
    pub fn without_delay() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Outcome of the robots.txt check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// Whether the target path may be fetched
    pub allowed: bool,
    /// Crawl-delay requested for our agent (zero when none)
    pub crawl_delay: Duration,
}

impl GateDecision {
    /// Decision used when no policy could be read
    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            crawl_delay: Duration::ZERO,
        }
    }
}

/// Robots.txt and pacing policy for a single scan
pub struct EthicsGate {
    client: Client,
    product_token: String,
    politeness: Politeness,
    cancel: CancellationToken,
}

impl EthicsGate {
    /// Creates a gate that reads robots.txt through `client`
    ///
    /// # Arguments
    ///
    /// * `client` - The identified HTTP client (its timeout bounds robots.txt reads)
    /// * `product_token` - The agent name matched against robots.txt groups
    /// * `politeness` - Delay and backoff parameters
    /// * `cancel` - The caller's cancellation token
    pub fn new(
        client: Client,
        product_token: impl Into<String>,
        politeness: Politeness,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            product_token: product_token.into(),
            politeness,
            cancel,
        }
    }

    /// Returns the pacing parameters of this gate
    pub fn politeness(&self) -> &Politeness {
        &self.politeness
    }

    /// Reads robots.txt once and answers both the allow and crawl-delay questions
    ///
    /// # Returns
    ///
    /// * `Ok(GateDecision)` - The decision (fail-open on any read failure)
    /// * `Err(ScanError::Cancelled)` - The scan was cancelled during the read
    pub async fn check(&self, url: &Url) -> Result<GateDecision, ScanError> {
        match cancellable(&self.cancel, fetch_robots(&self.client, url)).await? {
            Ok(robots) => Ok(self.decide(&robots, url)),
            Err(e) => {
                tracing::warn!(
                    "robots.txt for {} unreachable ({}), allowing scan",
                    url,
                    e
                );
                Ok(GateDecision::fail_open())
            }
        }
    }

    /// Returns true if robots.txt permits fetching `url`
    pub async fn allowed(&self, url: &Url) -> Result<bool, ScanError> {
        Ok(self.check(url).await?.allowed)
    }

    /// Returns the Crawl-delay for our agent, zero when absent or unreadable
    pub async fn crawl_delay(&self, url: &Url) -> Result<Duration, ScanError> {
        Ok(self.check(url).await?.crawl_delay)
    }

    /// Evaluates an already fetched policy
    pub fn decide(&self, robots: &ParsedRobots, url: &Url) -> GateDecision {
        let allowed = is_allowed(robots, url, &self.product_token);
        let crawl_delay = robots
            .crawl_delay(&self.product_token)
            .map(bounded_crawl_delay)
            .unwrap_or(Duration::ZERO);

        if allowed {
            tracing::info!("robots.txt permits {} (crawl delay {:?})", url, crawl_delay);
        } else {
            tracing::warn!("URL {} disallowed by robots.txt for {}", url, self.product_token);
        }

        GateDecision {
            allowed,
            crawl_delay,
        }
    }

    /// Sleeps before the fetch
    ///
    /// The wait is a triangular sample over the politeness bounds, raised to
    /// `crawl_delay` when the site asks for more. `crawl_delay` is capped at
    /// [`MAX_CRAWL_DELAY`].
    pub async fn delay(&self, crawl_delay: Duration) -> Result<Duration, ScanError> {
        let sampled = sample_delay(self.politeness.min_delay, self.politeness.max_delay);
        let wait = sampled.max(bounded_crawl_delay(crawl_delay));
        tracing::debug!("Waiting {:?} before fetching", wait);
        sleep_or_cancel(wait, &self.cancel).await?;
        Ok(wait)
    }
}
