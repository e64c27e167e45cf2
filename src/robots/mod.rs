//! Robots.txt handling module
//!
//! This module fetches and parses the robots.txt of the scanned origin. The
//! policy decision built on top of it (including the fail-open fallback)
//! lives in [`crate::ethics`].

mod parser;

pub use parser::ParsedRobots;

use reqwest::{Client, StatusCode};
use url::Url;

/// Returns the robots.txt URL for the origin of `target`
pub fn robots_url(target: &Url) -> Option<Url> {
    target.join("/robots.txt").ok()
}

/// Fetches robots.txt for the origin of a target URL
///
/// The status decides the policy when no body is read: 401, 403 and server
/// errors disallow everything, any other non-success status (typically 404)
/// means the site publishes no policy and allows everything.
///
/// # Arguments
///
/// * `client` - The identified HTTP client
/// * `target` - The URL being scanned
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - The site's policy, or the status-derived policy
/// * `Err(reqwest::Error)` - The robots.txt request or body read failed
pub async fn fetch_robots(client: &Client, target: &Url) -> Result<ParsedRobots, reqwest::Error> {
    let Some(robots_url) = robots_url(target) else {
        return Ok(ParsedRobots::allow_all());
    };

    let response = client.get(robots_url.clone()).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Ok(policy_for_status(&robots_url, status));
    }

    let body = response.text().await?;
    tracing::debug!("Fetched robots.txt from {} ({} bytes)", robots_url, body.len());
    Ok(ParsedRobots::from_content(&body))
}

/// Maps a non-success robots.txt status to a policy
fn policy_for_status(robots_url: &Url, status: StatusCode) -> ParsedRobots {
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status.is_server_error()
    {
        tracing::warn!(
            "robots.txt at {} answered {}, treating the site as disallowed",
            robots_url,
            status.as_u16()
        );
        ParsedRobots::disallow_all()
    } else {
        tracing::debug!("No robots.txt at {} (status {})", robots_url, status.as_u16());
        ParsedRobots::allow_all()
    }
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &Url, user_agent: &str) -> bool {
    robots.is_allowed(url.as_str(), user_agent)
}
