//! Extraction over a fetched page
//!
//! Everything here except the `security.txt` probe and the TLS issuer
//! lookup is a pure function of a [`FetchResult`]. Those two open their own
//! connections and are best effort: failures become absent data.

mod emails;
mod fingerprint;
mod headers;
mod parser;
mod security_txt;
mod tls;

pub use emails::{extract_emails, extract_emails_from_text, visible_text, MAX_EMAILS};
pub use fingerprint::{detect_static, LIVE_PROBES, STATIC_MARKERS};
pub use headers::{
    classify_security_headers, has_critical_missing, header_value, missing_headers,
    CRITICAL_HEADERS, IMPORTANT_HEADERS, SECURITY_HEADERS,
};
pub use parser::{categorize_links, parse_document, parse_html, LinkSets, ParsedPage};
pub use security_txt::{probe_security_txt, PROBE_TIMEOUT, SECURITY_TXT_PATHS};
pub use tls::{issuer_organization, lookup_issuer, LOOKUP_TIMEOUT, TLS_PORT};

use crate::fetcher::FetchResult;
use scraper::Html;
use std::collections::BTreeMap;

/// Everything derivable from the response alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFindings {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub generator: Option<String>,
    pub server: Option<String>,
    pub powered_by: Option<String>,
    pub security_headers: BTreeMap<String, String>,
    pub missing_important_headers: Vec<String>,
    pub js_framework_hints: Vec<String>,
    pub emails: Vec<String>,
    pub links: LinkSets,
}

/// Runs the pure extractors over a fetched page
///
/// Links resolve against the final URL, so redirects are accounted for.
pub fn analyze(page: &FetchResult) -> PageFindings {
    let document = Html::parse_document(&page.body);
    let parsed = parse_document(&document, &page.final_url);

    PageFindings {
        title: parsed.title,
        meta_description: parsed.meta_description,
        generator: parsed.generator,
        server: header_value(&page.headers, "server"),
        powered_by: header_value(&page.headers, "x-powered-by"),
        security_headers: classify_security_headers(&page.headers),
        missing_important_headers: missing_headers(&page.headers),
        js_framework_hints: framework_hints(page),
        emails: extract_emails(&document),
        links: parsed.links,
    }
}

/// Framework names for the report
///
/// A rendered page carries live probe results, which take precedence over
/// markers in the HTML.
pub fn framework_hints(page: &FetchResult) -> Vec<String> {
    match &page.live_frameworks {
        Some(live) => live.clone(),
        None => detect_static(&page.body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use url::Url;

    fn page(body: &str, headers: HeaderMap) -> FetchResult {
        FetchResult {
            status_code: 200,
            headers,
            body: body.to_string(),
            final_url: Url::parse("https://a.example/page").unwrap(),
            live_frameworks: None,
        }
    }

    #[test]
    fn test_analyze_collects_findings() {
        let mut headers = HeaderMap::new();
        headers.insert("server", HeaderValue::from_static("nginx"));
        headers.insert("x-powered-by", HeaderValue::from_static("PHP/8.2"));
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));

        let body = r#"<html><head><title>Home</title>
            <meta name="generator" content="WordPress 6.4">
            <script src="/js/jquery.min.js"></script></head>
            <body><a href="/about">About</a><a href="https://other.test/">Other</a>
            <p>security@a.example</p></body></html>"#;

        let findings = analyze(&page(body, headers));
        assert_eq!(findings.title.as_deref(), Some("Home"));
        assert_eq!(findings.generator.as_deref(), Some("WordPress 6.4"));
        assert_eq!(findings.server.as_deref(), Some("nginx"));
        assert_eq!(findings.powered_by.as_deref(), Some("PHP/8.2"));
        assert_eq!(
            findings.security_headers.get("X-Frame-Options").map(String::as_str),
            Some("DENY")
        );
        assert_eq!(
            findings.missing_important_headers,
            vec![
                "Content-Security-Policy",
                "Strict-Transport-Security",
                "X-Content-Type-Options"
            ]
        );
        assert_eq!(findings.js_framework_hints, vec!["jQuery"]);
        assert_eq!(findings.emails, vec!["security@a.example"]);
        assert_eq!(findings.links.internal, vec!["https://a.example/about"]);
        assert_eq!(findings.links.external, vec!["https://other.test/"]);
    }

    #[test]
    fn test_live_frameworks_take_precedence() {
        let mut rendered = page(r#"<script src="react-dom.js"></script>"#, HeaderMap::new());
        rendered.live_frameworks = Some(vec!["Vue".to_string()]);
        assert_eq!(framework_hints(&rendered), vec!["Vue"]);

        rendered.live_frameworks = None;
        assert_eq!(framework_hints(&rendered), vec!["React"]);
    }

    #[test]
    fn test_analyze_empty_body() {
        let findings = analyze(&page("", HeaderMap::new()));
        assert_eq!(findings.title, None);
        assert!(findings.emails.is_empty());
        assert_eq!(findings.missing_important_headers.len(), IMPORTANT_HEADERS.len());
    }
}
