//! Identified HTTP client construction

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Product name announced in the User-Agent and matched against robots.txt
pub const PRODUCT_TOKEN: &str = "Kensa";

/// Maximum redirect hops followed by the static fetcher
pub const MAX_REDIRECTS: usize = 10;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Formats the outbound User-Agent string
///
/// Format: `Kensa/<version> (+security posture scanner; <contact>)`. The
/// contact lets a site operator reach whoever ran the scan.
///
/// # Example
///
/// ```
/// use kensa::fetcher::user_agent;
///
/// let ua = user_agent("secops@example.com");
/// assert!(ua.starts_with("Kensa/"));
/// assert!(ua.ends_with("; secops@example.com)"));
/// ```
pub fn user_agent(contact: &str) -> String {
    format!(
        "{}/{} (+security posture scanner; {})",
        PRODUCT_TOKEN,
        env!("CARGO_PKG_VERSION"),
        contact
    )
}

/// Builds an HTTP client with identification headers and bounded timeouts
///
/// Certificate verification stays enabled and redirects are followed up to
/// [`MAX_REDIRECTS`] hops.
///
/// # Arguments
///
/// * `contact` - The operator contact embedded in the User-Agent
/// * `timeout` - Total timeout applied to every request
pub fn build_http_client(contact: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert("DNT", HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(user_agent(contact))
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .use_rustls_tls()
        .gzip(true)
        .brotli(true)
        .build()
}
