//! `security.txt` existence probe

use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Locations probed, in order
pub const SECURITY_TXT_PATHS: [&str; 2] = ["/.well-known/security.txt", "/security.txt"];

/// Per-probe timeout ceiling
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Looks for a `security.txt` on the target's origin
///
/// Sends a HEAD request to each of [`SECURITY_TXT_PATHS`] and stops at the
/// first success. Failures of any kind mean "not found".
///
/// # Returns
///
/// * `Some(Url)` - Where the file was found
/// * `None` - Neither location answered with success
pub async fn probe_security_txt(client: &Client, target: &Url, timeout: Duration) -> Option<Url> {
    let timeout = timeout.min(PROBE_TIMEOUT);

    for path in SECURITY_TXT_PATHS {
        let Ok(candidate) = target.join(path) else {
            continue;
        };

        match client.head(candidate.clone()).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Found security.txt at {}", candidate);
                return Some(candidate);
            }
            Ok(response) => {
                tracing::debug!(
                    "No security.txt at {} (status {})",
                    candidate,
                    response.status().as_u16()
                );
            }
            Err(e) => {
                tracing::debug!("security.txt check at {} failed: {}", candidate, e);
            }
        }
    }

    None
}
