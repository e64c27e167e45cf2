//! Integration tests for the scanner
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! scan pipeline end-to-end with the politeness delay disabled. TLS failures
//! are exercised against a local server with a self-signed certificate.

mod scan_tests;
mod tls_tests;
