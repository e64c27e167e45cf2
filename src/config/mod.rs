//! Configuration module for Kensa
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags override the loaded values in the binary.
//!
//! # Example
//!
//! ```no_run
//! use kensa::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("kensa.toml")).unwrap();
//! println!("Contact: {}", config.scanner.contact_email);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputConfig, PolitenessConfig, ScannerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_email};
