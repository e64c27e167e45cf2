//! Target URL handling for Kensa
//!
//! This module turns user input into a validated absolute HTTP(S) target and
//! provides the host comparisons used for link categorization.

mod domain;

pub use domain::{extract_domain, same_host};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates a scan target
///
/// # Sanitizing Steps
///
/// 1. Trim surrounding whitespace
/// 2. Prefix `https://` when no scheme is given (`example.com` → `https://example.com`)
/// 3. Parse; reject malformed input
/// 4. Reject schemes other than `http` and `https`
/// 5. Reject URLs without a host
///
/// # Arguments
///
/// * `raw` - The target as typed by the caller
///
/// # Returns
///
/// * `Ok(Url)` - An absolute HTTP(S) URL
/// * `Err(UrlError)` - The input cannot be scanned
///
/// # Examples
///
/// ```
/// use kensa::url::parse_target;
///
/// let url = parse_target("  example.com/login ").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/login");
/// ```
pub fn parse_target(raw: &str) -> UrlResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty target".to_string()));
    }

    let candidate = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(format!("{}: {}", trimmed, e)))?;
    validate_target(url)
}

/// Checks that an already parsed URL can be scanned
///
/// Only `http` and `https` URLs with a non-empty host pass.
pub fn validate_target(url: Url) -> UrlResult<Url> {
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Returns true if the input already carries a `scheme://` prefix
fn has_scheme(input: &str) -> bool {
    match input.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Builds a file-name-safe slug from a URL's host and path
///
/// Used when naming persisted reports.
pub fn url_slug(url: &Url) -> String {
    let raw = format!(
        "{}{}",
        url.host_str().unwrap_or("unknown"),
        url.port().map(|p| format!("_{}", p)).unwrap_or_default()
    ) + url.path();

    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect::<String>()
        .trim_end_matches('_')
        .to_string()
}
