//! Browser-based fetch for script-heavy pages
//!
//! Launches an exclusive headless Chromium for one navigation, waits for the
//! network to go quiet, then collects the navigation response, the rendered
//! DOM and live framework probes. Only available with the `browser`
//! feature; without it every rendered fetch reports `PipelineUnavailable`.
//!
//! There is no retry loop here. A browser launch costs far more than an
//! HTTP request, so retrying is left to the caller.

use crate::fetcher::FetchResult;
use crate::ScanError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

#[cfg(feature = "browser")]
use crate::cancel::cancellable;
#[cfg(feature = "browser")]
use crate::extract::LIVE_PROBES;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Viewport used for rendering
pub const VIEWPORT: (u32, u32) = (1280, 800);

/// Interval between network quiescence samples
#[cfg(feature = "browser")]
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Consecutive unchanged samples that count as network idle
#[cfg(feature = "browser")]
const IDLE_SAMPLES: u32 = 2;

/// Rendered strategy: real browser, scripts executed
#[derive(Debug, Clone)]
pub struct RenderedFetcher {
    user_agent: String,
    cancel: CancellationToken,
}

impl RenderedFetcher {
    /// Creates a rendered fetcher announcing `user_agent`
    pub fn new(user_agent: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            user_agent: user_agent.into(),
            cancel,
        }
    }

    /// Returns the User-Agent the browser announces
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(not(feature = "browser"))]
impl RenderedFetcher {
    /// Always fails: this build carries no browser runtime
    pub async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResult, ScanError> {
        let _ = (url, timeout, &self.cancel);
        tracing::error!("Rendered fetch requested but no browser runtime is available");
        Err(ScanError::PipelineUnavailable(
            "built without the `browser` feature; rebuild with `--features browser`".to_string(),
        ))
    }
}

#[cfg(feature = "browser")]
impl RenderedFetcher {
    /// Renders `url` once in a fresh browser process
    ///
    /// The browser is closed on every exit path, including cancellation.
    pub async fn fetch(&self, url: &Url, timeout: Duration) -> Result<FetchResult, ScanError> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(VIEWPORT.0, VIEWPORT.1)
            .request_timeout(timeout)
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--lang=en-US")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(ScanError::PipelineUnavailable)?;

        tracing::info!("Launching browser for {}", url);
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScanError::PipelineUnavailable(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let outcome = cancellable(
            &self.cancel,
            tokio::time::timeout(timeout, navigate(&browser, url)),
        )
        .await;

        if let Err(e) = browser.close().await {
            tracing::debug!("Failed to close browser: {}", e);
        }
        if let Err(e) = browser.wait().await {
            tracing::debug!("Failed to wait for browser exit: {}", e);
        }
        handler_task.abort();

        match outcome? {
            Ok(result) => {
                if let Ok(fetched) = &result {
                    tracing::info!("Rendered {} with status {}", url, fetched.status_code);
                }
                result
            }
            Err(_) => {
                tracing::warn!("Navigation to {} timed out after {:?}", url, timeout);
                Err(ScanError::Timeout { attempts: 1 })
            }
        }
    }
}

/// Navigates, waits for quiescence and collects the page
#[cfg(feature = "browser")]
async fn navigate(browser: &Browser, url: &Url) -> Result<FetchResult, ScanError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ScanError::Render(e.to_string()))?;

    page.goto(url.as_str())
        .await
        .map_err(|e| ScanError::Render(format!("navigation failed: {}", e)))?;

    let request = page
        .wait_for_navigation_response()
        .await
        .map_err(|e| ScanError::Render(e.to_string()))?
        .ok_or_else(|| ScanError::Render("Failed to load page".to_string()))?;

    let response = request
        .response
        .as_ref()
        .ok_or_else(|| ScanError::Render("Failed to load page".to_string()))?;

    wait_for_network_idle(&page).await;

    let body = page
        .content()
        .await
        .map_err(|e| ScanError::Render(e.to_string()))?;

    let final_url = Url::parse(&response.url).unwrap_or_else(|_| url.clone());
    let status_code = u16::try_from(response.status).unwrap_or(0);
    let headers = headers_from_json(response.headers.inner());
    let live_frameworks = probe_frameworks(&page).await;

    Ok(FetchResult {
        status_code,
        headers,
        body,
        final_url,
        live_frameworks: Some(live_frameworks),
    })
}

/// Waits until the count of loaded resources stops growing
#[cfg(feature = "browser")]
async fn wait_for_network_idle(page: &Page) {
    let mut last: Option<u64> = None;
    let mut stable = 0;

    while stable < IDLE_SAMPLES {
        tokio::time::sleep(IDLE_POLL).await;
        let count = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<u64>().ok());

        match (count, last) {
            (Some(now), Some(before)) if now == before => stable += 1,
            (Some(now), _) => {
                stable = 0;
                last = Some(now);
            }
            (None, _) => return,
        }
    }
}

/// Evaluates every live probe against the page's global namespace
#[cfg(feature = "browser")]
async fn probe_frameworks(page: &Page) -> Vec<String> {
    let mut found = Vec::new();
    for (name, expression) in LIVE_PROBES {
        let present = page
            .evaluate(*expression)
            .await
            .ok()
            .and_then(|v| v.into_value::<bool>().ok())
            .unwrap_or(false);
        if present {
            found.push((*name).to_string());
        }
    }
    found
}

/// Converts a CDP header object into a header map
///
/// CDP folds repeated headers into one value separated by newlines.
#[cfg(feature = "browser")]
fn headers_from_json(value: &serde_json::Value) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let Some(object) = value.as_object() else {
        return headers;
    };

    for (name, raw) in object {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        let Some(raw) = raw.as_str() else {
            continue;
        };
        for line in raw.split('\n') {
            if let Ok(value) = HeaderValue::from_str(line) {
                headers.append(name.clone(), value);
            }
        }
    }
    headers
}

#[cfg(all(test, not(feature = "browser")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_runtime_is_pipeline_unavailable() {
        let fetcher = RenderedFetcher::new("Kensa/1.0", CancellationToken::new());
        let url = Url::parse("https://example.com/").unwrap();
        let result = fetcher.fetch(&url, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(ScanError::PipelineUnavailable(_))));
    }
}
