//! Terminal summary of a report

use crate::report::SecurityReport;

/// Addresses listed in the summary; the JSON report keeps all of them
pub const MAX_SUMMARY_EMAILS: usize = 3;

/// Formats a report for the terminal
///
/// # Returns
///
/// A multi-line, plain-text rendering of the report
pub fn render_summary(report: &SecurityReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("Security scan: {}\n", report.url));
    out.push_str(&format!("Captured: {}\n", report.timestamp.to_rfc3339()));

    if let Some(error) = &report.error {
        out.push_str(&format!("\nERROR: {}\n", error));
        if report.status_code != 0 {
            out.push_str(&format!("Last status: {}\n", report.status_code));
        }
        return out;
    }

    // Page information
    out.push_str("\n[Page]\n");
    out.push_str(&format!("  Status: {}\n", report.status_code));
    out.push_str(&format!("  Title: {}\n", or_none(&report.title)));
    if let Some(description) = &report.meta_description {
        out.push_str(&format!("  Description: {}\n", description));
    }

    // Server & technology
    out.push_str("\n[Technology]\n");
    out.push_str(&format!("  Server: {}\n", or_none(&report.server)));
    out.push_str(&format!("  Powered-By: {}\n", or_none(&report.powered_by)));
    out.push_str(&format!("  Generator: {}\n", or_none(&report.generator)));
    if report.js_framework_hints.is_empty() {
        out.push_str("  Frameworks: none detected\n");
    } else {
        out.push_str(&format!(
            "  Frameworks: {}\n",
            report.js_framework_hints.join(", ")
        ));
    }

    // Headers
    out.push_str("\n[Security headers]\n");
    if report.security_headers.is_empty() {
        out.push_str("  (none present)\n");
    }
    for (name, value) in &report.security_headers {
        out.push_str(&format!("  + {}: {}\n", name, value));
    }
    for name in &report.missing_important_headers {
        out.push_str(&format!("  - {} (missing)\n", name));
    }

    // security.txt and TLS
    out.push_str("\n[Disclosure & TLS]\n");
    match &report.security_txt_url {
        Some(url) => out.push_str(&format!("  security.txt: {}\n", url)),
        None => out.push_str("  security.txt: not found\n"),
    }
    out.push_str(&format!(
        "  TLS verified: {}\n",
        if report.ssl_verified { "yes" } else { "no" }
    ));
    out.push_str(&format!("  TLS issuer: {}\n", or_none(&report.ssl_issuer)));

    // Links and emails
    out.push_str("\n[Content]\n");
    out.push_str(&format!(
        "  Links: {} internal, {} external\n",
        report.internal_links_count, report.external_links_count
    ));
    if !report.extracted_emails.is_empty() {
        let shown: Vec<&str> = report
            .extracted_emails
            .iter()
            .take(MAX_SUMMARY_EMAILS)
            .map(String::as_str)
            .collect();
        out.push_str(&format!("  Emails: {}", shown.join(", ")));
        if report.extracted_emails.len() > MAX_SUMMARY_EMAILS {
            out.push_str(&format!(
                " (+{} more)",
                report.extracted_emails.len() - MAX_SUMMARY_EMAILS
            ));
        }
        out.push('\n');
    }

    if report.has_critical_missing_headers() {
        out.push_str("\nALERT: critical security headers missing (CSP, HSTS or X-Frame-Options)\n");
    }

    out
}

fn or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}
