//! Email address extraction from visible page text
//!
//! At most [`MAX_EMAILS`] addresses are kept. The cap limits how much
//! incidental personal data ends up in a report.

use regex::Regex;
use scraper::{Html, Node};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Maximum number of addresses recorded per report
pub const MAX_EMAILS: usize = 5;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("email pattern is a valid regex")
});

/// Elements whose text is never rendered
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "template", "noscript"];

/// Returns the document's visible text, one text node per line
pub fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        text.push_str(fragment);
        text.push('\n');
    }

    text
}

/// Extracts up to [`MAX_EMAILS`] distinct addresses in first-seen order
pub fn extract_emails(document: &Html) -> Vec<String> {
    extract_emails_from_text(&visible_text(document))
}

/// Same as [`extract_emails`] over plain text
pub fn extract_emails_from_text(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    EMAIL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|email| seen.insert(email.clone()))
        .take(MAX_EMAILS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_addresses() {
        let emails = extract_emails_from_text("Contact security@example.com or sales@example.org.");
        assert_eq!(emails, vec!["security@example.com", "sales@example.org"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let emails = extract_emails_from_text("a@example.com a@example.com b@example.com a@example.com");
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_capped_at_five() {
        let text = (0..12)
            .map(|i| format!("user{}@example.com", i))
            .collect::<Vec<_>>()
            .join(" ");
        let emails = extract_emails_from_text(&text);
        assert_eq!(emails.len(), MAX_EMAILS);
        assert_eq!(emails[0], "user0@example.com");
        assert_eq!(emails[4], "user4@example.com");
    }

    #[test]
    fn test_cap_counts_distinct_addresses() {
        let text = "a@x.io a@x.io a@x.io b@x.io c@x.io d@x.io e@x.io f@x.io";
        let emails = extract_emails_from_text(text);
        assert_eq!(emails, vec!["a@x.io", "b@x.io", "c@x.io", "d@x.io", "e@x.io"]);
    }

    #[test]
    fn test_script_text_is_not_visible() {
        let html = Html::parse_document(
            r#"<html><head><script>var x = "hidden@example.com";</script>
            <style>/* style@example.com */</style></head>
            <body><p>Write to shown@example.com</p></body></html>"#,
        );
        assert_eq!(extract_emails(&html), vec!["shown@example.com"]);
    }

    #[test]
    fn test_no_addresses() {
        assert!(extract_emails_from_text("nothing to see @ here").is_empty());
    }
}
