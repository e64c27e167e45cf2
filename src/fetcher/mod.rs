//! Page fetching strategies
//!
//! This module contains the two interchangeable ways of retrieving the
//! target page:
//! - [`StaticFetcher`]: one HTTP GET per attempt, with retry and backoff
//! - [`RenderedFetcher`]: a headless browser navigation, single attempt
//!
//! Both are wrapped by the [`Fetcher`] enum and produce the same
//! [`FetchResult`].

mod client;
mod rendered;
mod static_fetch;

pub use client::{build_http_client, user_agent, MAX_REDIRECTS, PRODUCT_TOKEN};
pub use rendered::{RenderedFetcher, VIEWPORT};
pub use static_fetch::{
    classify_transport_error, is_certificate_error, StaticFetcher, TransportFailure,
};

use crate::ethics::BackoffPolicy;
use crate::scan::{ScanRequest, Strategy};
use crate::ScanError;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A successfully fetched page
///
/// Produced once per successful attempt and discarded on retry.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Response headers (names compare case-insensitively)
    pub headers: HeaderMap,
    /// Raw HTML (static) or serialized rendered DOM (rendered)
    pub body: String,
    /// URL after redirects
    pub final_url: Url,
    /// Frameworks observed in the live page (rendered strategy only)
    pub live_frameworks: Option<Vec<String>>,
}

/// One fetch capability, two strategies
#[derive(Debug, Clone)]
pub enum Fetcher {
    Static(StaticFetcher),
    Rendered(RenderedFetcher),
}

impl Fetcher {
    /// Selects the strategy named by the request
    pub fn for_request(
        request: &ScanRequest,
        client: Client,
        backoff: BackoffPolicy,
        cancel: CancellationToken,
    ) -> Self {
        match request.strategy() {
            Strategy::Static => Self::Static(StaticFetcher::new(client, backoff, cancel)),
            Strategy::Rendered => {
                Self::Rendered(RenderedFetcher::new(user_agent(request.contact()), cancel))
            }
        }
    }

    /// Fetches the request's target with the selected strategy
    pub async fn fetch(&self, request: &ScanRequest) -> Result<FetchResult, ScanError> {
        match self {
            Self::Static(fetcher) => fetcher.fetch(request.target(), request.max_retries()).await,
            Self::Rendered(fetcher) => fetcher.fetch(request.target(), request.timeout()).await,
        }
    }

    /// Returns the strategy this fetcher implements
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Static(_) => Strategy::Static,
            Self::Rendered(_) => Strategy::Rendered,
        }
    }
}
