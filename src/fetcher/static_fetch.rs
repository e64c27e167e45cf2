//! Direct HTTP fetch with retry and backoff
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | 2xx/3xx | Return the page |
//! | HTTP 429/503/509 | Sleep backoff (or Retry-After), retry; last attempt → TransientHttp |
//! | Other 4xx/5xx | Immediate → DefinitiveHttp |
//! | Timeout | Retry immediately; last attempt → Timeout |
//! | TLS certificate error | Immediate → Certificate, no retry |
//! | Other transport error | Retry immediately; last attempt → Network |

use crate::cancel::{cancellable, sleep_or_cancel};
use crate::ethics::{backoff_delay, retry_after, should_backoff, BackoffPolicy};
use crate::fetcher::FetchResult;
use crate::ScanError;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a single HTTP attempt that produced a response
enum Attempt {
    /// The page was received
    Page(FetchResult),
    /// The server asked us to slow down
    Backoff {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// The server answered with a non-retryable error status
    Rejected { status: u16 },
}

/// Classification of a transport-level failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// TLS certificate verification failed
    Certificate(String),
    /// The request timed out
    Timeout,
    /// Anything else (refused connection, DNS, broken body)
    Other(String),
}

/// Static strategy: plain HTTP GET, no script execution
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    client: Client,
    backoff: BackoffPolicy,
    cancel: CancellationToken,
}

impl StaticFetcher {
    /// Creates a static fetcher around an identified client
    pub fn new(client: Client, backoff: BackoffPolicy, cancel: CancellationToken) -> Self {
        Self {
            client,
            backoff,
            cancel,
        }
    }

    /// Fetches `url`, retrying up to `max_attempts` times
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResult)` - The page was received with a non-error status
    /// * `Err(ScanError)` - A terminal failure, classified per the table above
    pub async fn fetch(&self, url: &Url, max_attempts: u32) -> Result<FetchResult, ScanError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            let is_last = attempt + 1 >= max_attempts;
            tracing::info!("Fetching {} (attempt {}/{})", url, attempt + 1, max_attempts);

            match cancellable(&self.cancel, self.attempt(url)).await? {
                Ok(Attempt::Page(result)) => {
                    tracing::info!(
                        "Fetched {} with status {} (final URL {})",
                        url,
                        result.status_code,
                        result.final_url
                    );
                    return Ok(result);
                }
                Ok(Attempt::Backoff {
                    status,
                    retry_after,
                }) => {
                    if is_last {
                        tracing::warn!("Still rate limited ({}) on {}, giving up", status, url);
                        return Err(ScanError::TransientHttp {
                            status,
                            attempts: max_attempts,
                        });
                    }
                    let wait = match retry_after {
                        Some(server_wait) => server_wait.min(self.backoff.cap),
                        None => backoff_delay(attempt, &self.backoff),
                    };
                    tracing::warn!(
                        "Rate limited ({}) on {}, backing off for {:?}",
                        status,
                        url,
                        wait
                    );
                    sleep_or_cancel(wait, &self.cancel).await?;
                }
                Ok(Attempt::Rejected { status }) => {
                    tracing::warn!("HTTP error {} for {}", status, url);
                    return Err(ScanError::DefinitiveHttp { status });
                }
                Err(e) => match classify_transport_error(&e) {
                    TransportFailure::Certificate(message) => {
                        tracing::error!("SSL verification failed for {}: {}", url, message);
                        return Err(ScanError::Certificate(message));
                    }
                    TransportFailure::Timeout => {
                        tracing::warn!("Timeout fetching {} (attempt {})", url, attempt + 1);
                        if is_last {
                            return Err(ScanError::Timeout {
                                attempts: max_attempts,
                            });
                        }
                    }
                    TransportFailure::Other(message) => {
                        tracing::error!(
                            "Request to {} failed (attempt {}): {}",
                            url,
                            attempt + 1,
                            message
                        );
                        if is_last {
                            return Err(ScanError::Network {
                                message,
                                attempts: max_attempts,
                            });
                        }
                    }
                },
            }

            attempt += 1;
        }
    }

    /// Performs one GET and reads the body
    async fn attempt(&self, url: &Url) -> Result<Attempt, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if should_backoff(status.as_u16()) {
            return Ok(Attempt::Backoff {
                status: status.as_u16(),
                retry_after: retry_after(response.headers()),
            });
        }

        if status.is_client_error() || status.is_server_error() {
            return Ok(Attempt::Rejected {
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let headers: HeaderMap = response.headers().clone();
        let body = response.text().await?;

        Ok(Attempt::Page(FetchResult {
            status_code: status.as_u16(),
            headers,
            body,
            final_url,
            live_frameworks: None,
        }))
    }
}

/// Classifies a reqwest error for the retry loop
pub fn classify_transport_error(error: &reqwest::Error) -> TransportFailure {
    // The outer message embeds the request URL, so only the sources are inspected
    if error.source().is_some_and(is_certificate_error) {
        return TransportFailure::Certificate(error_chain(error));
    }
    if error.is_timeout() {
        return TransportFailure::Timeout;
    }
    TransportFailure::Other(error_chain(error))
}

/// Walks an error's source chain looking for a TLS certificate failure
///
/// reqwest wraps the TLS backend's error several layers deep, so the chain
/// is matched on its messages rather than on concrete types.
pub fn is_certificate_error(error: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if message.contains("certificate")
            || message.contains("unknownissuer")
            || message.contains("self signed")
            || message.contains("self-signed")
        {
            return true;
        }
        current = err.source();
    }
    false
}

/// Joins an error and its sources into one line
fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut current = error.source();
    while let Some(err) = current {
        let message = err.to_string();
        if !parts.iter().any(|p| p.contains(&message)) {
            parts.push(message);
        }
        current = err.source();
    }
    parts.join(": ")
}
