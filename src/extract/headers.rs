//! Security header classification

use reqwest::header::HeaderMap;
use std::collections::BTreeMap;

/// Response headers whose presence affects browser-enforced security
pub const SECURITY_HEADERS: [&str; 10] = [
    "Content-Security-Policy",
    "Strict-Transport-Security",
    "X-Frame-Options",
    "X-Content-Type-Options",
    "X-XSS-Protection",
    "Referrer-Policy",
    "Permissions-Policy",
    "Cross-Origin-Embedder-Policy",
    "Cross-Origin-Opener-Policy",
    "Cross-Origin-Resource-Policy",
];

/// Baseline headers every page should send; reported when absent
pub const IMPORTANT_HEADERS: [&str; 4] = [
    "Content-Security-Policy",
    "Strict-Transport-Security",
    "X-Frame-Options",
    "X-Content-Type-Options",
];

/// Headers whose absence raises the critical alert
pub const CRITICAL_HEADERS: [&str; 3] = [
    "Content-Security-Policy",
    "Strict-Transport-Security",
    "X-Frame-Options",
];

/// Returns the first value of a header, compared case-insensitively
///
/// Non-UTF-8 bytes are replaced rather than dropped.
pub fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Collects the recognized security headers present in a response
///
/// Keys use the canonical casing from [`SECURITY_HEADERS`], whatever casing
/// the server sent.
pub fn classify_security_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    SECURITY_HEADERS
        .iter()
        .filter_map(|name| header_value(headers, name).map(|v| (name.to_string(), v)))
        .collect()
}

/// Lists the [`IMPORTANT_HEADERS`] absent from a response, in canonical order
pub fn missing_headers(headers: &HeaderMap) -> Vec<String> {
    IMPORTANT_HEADERS
        .iter()
        .filter(|name| !headers.contains_key(**name))
        .map(|name| name.to_string())
        .collect()
}

/// True if any of [`CRITICAL_HEADERS`] is in the missing list
pub fn has_critical_missing(missing: &[String]) -> bool {
    CRITICAL_HEADERS
        .iter()
        .any(|critical| missing.iter().any(|m| m.eq_ignore_ascii_case(critical)))
}
