//! Kensa: a polite security posture scanner
//!
//! This crate scans exactly one URL per invocation. It honors robots.txt and
//! rate-limit signals, fetches the page statically or through a headless
//! browser, and derives a [`SecurityReport`] from the response: security
//! headers, `security.txt`, framework fingerprints, links, exposed emails and
//! the TLS certificate issuer.

pub mod cancel;
pub mod config;
pub mod ethics;
pub mod extract;
pub mod fetcher;
pub mod output;
pub mod report;
pub mod robots;
pub mod scan;
pub mod url;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that end a scan
///
/// Every variant is recovered into the `error` field of the returned
/// [`SecurityReport`]; none of them escapes [`scan::run_scan`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("Disallowed by robots.txt")]
    PolicyDisallowed,

    #[error("SSL verification failed: {0}")]
    Certificate(String),

    #[error("Request timeout after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("HTTP {status} (rate limited) after {attempts} attempts")]
    TransientHttp { status: u16, attempts: u32 },

    #[error("HTTP error {status}")]
    DefinitiveHttp { status: u16 },

    #[error("Network error after {attempts} attempts: {message}")]
    Network { message: String, attempts: u32 },

    #[error("Browser error: {0}")]
    Render(String),

    #[error("Rendered fetch unavailable: {0}")]
    PipelineUnavailable(String),

    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Machine-readable category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PolicyDisallowed => ErrorKind::PolicyDisallowed,
            Self::Certificate(_) => ErrorKind::Certificate,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TransientHttp { .. } => ErrorKind::TransientHttp,
            Self::DefinitiveHttp { .. } => ErrorKind::DefinitiveHttp,
            Self::Network { .. } => ErrorKind::Network,
            Self::Render(_) => ErrorKind::Render,
            Self::PipelineUnavailable(_) => ErrorKind::PipelineUnavailable,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Last HTTP status observed before the failure, or 0 if none
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TransientHttp { status, .. } | Self::DefinitiveHttp { status } => *status,
            _ => 0,
        }
    }
}

/// Serializable error category carried by error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PolicyDisallowed,
    Certificate,
    Timeout,
    TransientHttp,
    DefinitiveHttp,
    Network,
    Render,
    PipelineUnavailable,
    Cancelled,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Target URL errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use ethics::{BackoffPolicy, EthicsGate, Politeness};
pub use fetcher::{FetchResult, Fetcher};
pub use report::SecurityReport;
pub use scan::{run_scan, ScanRequest, Scanner, Strategy};
