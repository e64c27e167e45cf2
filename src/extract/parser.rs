//! HTML parser for page metadata and links
//!
//! This module handles parsing HTML content to extract:
//! - Page title, meta description and generator
//! - Hyperlinks, split into internal and external sets

use crate::url::same_host;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Metadata and links extracted from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from the first `<title>` tag)
    pub title: Option<String>,

    /// `<meta name="description">` content
    pub meta_description: Option<String>,

    /// `<meta name="generator">` content (e.g. "WordPress 6.4")
    pub generator: Option<String>,

    /// Categorized hyperlinks
    pub links: LinkSets,
}

/// Hyperlinks split by host, deduplicated, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSets {
    /// Links whose host equals the page's host
    pub internal: Vec<String>,
    /// Links to any other host
    pub external: Vec<String>,
}

/// Parses HTML content and extracts metadata and links
///
/// # Example
///
/// ```
/// use kensa::extract::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links.internal, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    parse_document(&Html::parse_document(html), base_url)
}

/// Same as [`parse_html`] over an already parsed document
pub fn parse_document(document: &Html, base_url: &Url) -> ParsedPage {
    ParsedPage {
        title: extract_title(document),
        meta_description: extract_meta(document, "description"),
        generator: extract_meta(document, "generator"),
        links: categorize_links(document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the content of `<meta name="...">`
fn extract_meta(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse("meta[name][content]").ok()?;

    document
        .select(&selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Splits every `<a href>` target into internal and external links
pub fn categorize_links(document: &Html, base_url: &Url) -> LinkSets {
    let mut sets = LinkSets::default();
    let mut seen: HashSet<String> = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return sets;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute_url) = resolve_link(href, base_url) else {
            continue;
        };

        let resolved = absolute_url.to_string();
        if !seen.insert(resolved.clone()) {
            continue;
        }

        if same_host(&absolute_url, base_url) {
            sets.internal.push(resolved);
        } else {
            sets.external.push(resolved);
        }
    }

    sets
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty and fragment-only (`#top`) hrefs
/// - `javascript:` and `mailto:` targets
/// - anything that does not resolve to HTTP(S) (tel:, data:, ...)
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:") || lowered.starts_with("mailto:") {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
