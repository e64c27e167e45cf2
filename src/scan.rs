//! Scan orchestration
//!
//! A scan runs as one sequence:
//! 1. robots.txt check (skipped when robots are not respected)
//! 2. politeness delay
//! 3. page fetch with the selected strategy
//! 4. extraction, with the `security.txt` probe and TLS lookup run concurrently
//! 5. report assembly
//!
//! Every failure along the way becomes an error report. [`Scanner::run`]
//! never returns an error.

use crate::cancel::cancellable;
use crate::ethics::{EthicsGate, Politeness};
use crate::extract::{analyze, lookup_issuer, probe_security_txt};
use crate::fetcher::{build_http_client, Fetcher, PRODUCT_TOKEN};
use crate::report::{Enrichment, SecurityReport};
use crate::url::{parse_target, validate_target};
use crate::{ScanError, UrlResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Default number of fetch attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How the page is retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Plain HTTP GET
    #[default]
    Static,
    /// Headless browser, scripts executed
    Rendered,
}

/// Parameters of a single scan
///
/// Built once by the caller and consumed by [`Scanner::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    target: Url,
    contact: String,
    respect_robots: bool,
    max_retries: u32,
    timeout: Duration,
    strategy: Strategy,
}

impl ScanRequest {
    /// Creates a request with default settings
    ///
    /// A bare host such as `example.com` is scanned over `https`.
    ///
    /// # Arguments
    ///
    /// * `target` - The URL to scan (absolute HTTP/HTTPS, or a bare host)
    /// * `contact` - Operator contact announced in the User-Agent
    pub fn new(target: &str, contact: impl Into<String>) -> UrlResult<Self> {
        Self::for_url(parse_target(target)?, contact)
    }

    /// Creates a request for an already parsed URL
    ///
    /// The URL must be `http` or `https` and carry a host.
    pub fn for_url(target: Url, contact: impl Into<String>) -> UrlResult<Self> {
        Ok(Self {
            target: validate_target(target)?,
            contact: contact.into(),
            respect_robots: true,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            strategy: Strategy::Static,
        })
    }

    pub fn with_respect_robots(mut self, respect_robots: bool) -> Self {
        self.respect_robots = respect_robots;
        self
    }

    /// Sets the number of fetch attempts (at least one)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn respect_robots(&self) -> bool {
        self.respect_robots
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

/// Runs scans with fixed pacing and a shared cancellation token
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    politeness: Politeness,
    cancel: CancellationToken,
}

impl Scanner {
    /// Creates a scanner with the given pacing
    pub fn new(politeness: Politeness) -> Self {
        Self {
            politeness,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to abort in-flight scans
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the token that aborts this scanner's scans
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Scans the request's target and returns the report
    ///
    /// Failures are encoded in the report's `error` field.
    #[tracing::instrument(
        name = "scan",
        skip_all,
        fields(url = %request.target(), strategy = ?request.strategy())
    )]
    pub async fn run(&self, request: ScanRequest) -> SecurityReport {
        match self.execute(&request).await {
            Ok(report) => {
                tracing::info!(
                    "Scan complete: status {}, {} security headers, {} missing",
                    report.status_code,
                    report.security_headers.len(),
                    report.missing_important_headers.len()
                );
                report
            }
            Err(e) => {
                tracing::error!("Scan failed ({:?}): {}", e.kind(), e);
                SecurityReport::failure(request.target(), &e, Utc::now())
            }
        }
    }

    async fn execute(&self, request: &ScanRequest) -> Result<SecurityReport, ScanError> {
        let target = request.target();
        let client = build_http_client(request.contact(), request.timeout()).map_err(|e| {
            ScanError::Network {
                message: e.to_string(),
                attempts: 0,
            }
        })?;

        let gate = EthicsGate::new(
            client.clone(),
            PRODUCT_TOKEN,
            self.politeness,
            self.cancel.clone(),
        );

        let crawl_delay = if request.respect_robots() {
            let decision = gate.check(target).await?;
            if !decision.allowed {
                return Err(ScanError::PolicyDisallowed);
            }
            decision.crawl_delay
        } else {
            tracing::info!("Skipping robots.txt check");
            Duration::ZERO
        };

        gate.delay(crawl_delay).await?;

        let fetcher = Fetcher::for_request(
            request,
            client.clone(),
            self.politeness.backoff,
            self.cancel.clone(),
        );
        let page = fetcher.fetch(request).await?;

        let findings = analyze(&page);

        let (security_txt_url, ssl_issuer) = cancellable(&self.cancel, async {
            tokio::join!(
                probe_security_txt(&client, target, request.timeout()),
                lookup_issuer(target, request.timeout()),
            )
        })
        .await?;

        Ok(SecurityReport::success(
            target,
            page.status_code,
            findings,
            Enrichment {
                security_txt_url,
                ssl_issuer,
            },
            Utc::now(),
        ))
    }
}

/// Scans one URL with default pacing
pub async fn run_scan(request: ScanRequest) -> SecurityReport {
    Scanner::default().run(request).await
}
