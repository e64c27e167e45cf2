//! The scan report
//!
//! A [`SecurityReport`] is built exactly once per scan and is either a
//! success report or an error report. Error reports carry no extraction
//! data at all.

use crate::extract::{has_critical_missing, PageFindings};
use crate::{ErrorKind, ScanError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Security posture of a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub url: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub security_headers: BTreeMap<String, String>,
    pub missing_important_headers: Vec<String>,
    pub server: Option<String>,
    pub powered_by: Option<String>,
    pub generator: Option<String>,
    pub has_security_txt: bool,
    pub security_txt_url: Option<String>,
    pub js_framework_hints: Vec<String>,
    pub ssl_verified: bool,
    pub ssl_issuer: Option<String>,
    pub extracted_emails: Vec<String>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    pub internal_links_count: usize,
    pub external_links_count: usize,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
}

/// Enrichment gathered over separate connections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub security_txt_url: Option<Url>,
    pub ssl_issuer: Option<String>,
}

impl SecurityReport {
    /// Assembles a success report
    ///
    /// `ssl_verified` is true: the page fetch completed, so any TLS in the
    /// path passed verification.
    pub fn success(
        target: &Url,
        status_code: u16,
        findings: PageFindings,
        enrichment: Enrichment,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let PageFindings {
            title,
            meta_description,
            generator,
            server,
            powered_by,
            security_headers,
            missing_important_headers,
            js_framework_hints,
            emails,
            links,
        } = findings;

        Self {
            url: target.to_string(),
            status_code,
            timestamp,
            title,
            meta_description,
            security_headers,
            missing_important_headers,
            server,
            powered_by,
            generator,
            has_security_txt: enrichment.security_txt_url.is_some(),
            security_txt_url: enrichment.security_txt_url.map(String::from),
            js_framework_hints,
            ssl_verified: true,
            ssl_issuer: enrichment.ssl_issuer,
            extracted_emails: emails,
            internal_links_count: links.internal.len(),
            external_links_count: links.external.len(),
            internal_links: links.internal,
            external_links: links.external,
            error: None,
            error_kind: None,
        }
    }

    /// Assembles an error report
    ///
    /// Every extraction field is empty. The status code is the last one
    /// observed, or 0.
    pub fn failure(target: &Url, error: &ScanError, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: target.to_string(),
            status_code: error.status_code(),
            timestamp,
            title: None,
            meta_description: None,
            security_headers: BTreeMap::new(),
            missing_important_headers: Vec::new(),
            server: None,
            powered_by: None,
            generator: None,
            has_security_txt: false,
            security_txt_url: None,
            js_framework_hints: Vec::new(),
            ssl_verified: false,
            ssl_issuer: None,
            extracted_emails: Vec::new(),
            internal_links: Vec::new(),
            external_links: Vec::new(),
            internal_links_count: 0,
            external_links_count: 0,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }

    /// True if CSP, HSTS or X-Frame-Options is missing
    pub fn has_critical_missing_headers(&self) -> bool {
        has_critical_missing(&self.missing_important_headers)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serializes the report as pretty-printed JSON
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
