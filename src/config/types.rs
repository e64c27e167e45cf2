use crate::ethics::{BackoffPolicy, Politeness};
use crate::scan::{ScanRequest, Strategy};
use crate::UrlResult;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Kensa
///
/// Every section and key is optional; missing values take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub politeness: PolitenessConfig,
    pub output: OutputConfig,
}

/// Scan behavior configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScannerConfig {
    /// Contact announced in the User-Agent of every request
    pub contact_email: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Number of fetch attempts
    pub max_retries: u32,

    /// Whether robots.txt is consulted before fetching
    pub respect_robots: bool,

    /// Fetch strategy ("static" or "rendered")
    pub strategy: Strategy,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            contact_email: "security@example.com".to_string(),
            timeout_secs: 15,
            max_retries: 3,
            respect_robots: true,
            strategy: Strategy::Static,
        }
    }
}

/// Request pacing configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct PolitenessConfig {
    /// Lower bound of the pre-fetch delay (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the pre-fetch delay (milliseconds)
    pub max_delay_ms: u64,

    /// First backoff step on a rate-limit status (milliseconds)
    pub backoff_base_ms: u64,

    /// Backoff ceiling (milliseconds)
    pub backoff_cap_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2500,
            max_delay_ms: 7000,
            backoff_base_ms: 2000,
            backoff_cap_ms: 60_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory report files are written to
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
        }
    }
}

impl Config {
    /// Pacing parameters for the scanner
    pub fn politeness(&self) -> Politeness {
        let p = &self.politeness;
        Politeness {
            min_delay: Duration::from_millis(p.min_delay_ms),
            max_delay: Duration::from_millis(p.max_delay_ms),
            backoff: BackoffPolicy {
                base: Duration::from_millis(p.backoff_base_ms),
                cap: Duration::from_millis(p.backoff_cap_ms),
            },
        }
    }

    /// Builds a scan request for `target` with the configured settings
    ///
    /// Fails when `target` is not an `http` or `https` URL with a host.
    pub fn scan_request(&self, target: Url) -> UrlResult<ScanRequest> {
        let s = &self.scanner;
        Ok(ScanRequest::for_url(target, s.contact_email.clone())?
            .with_respect_robots(s.respect_robots)
            .with_max_retries(s.max_retries)
            .with_timeout(Duration::from_secs(s.timeout_secs))
            .with_strategy(s.strategy))
    }
}
