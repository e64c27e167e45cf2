//! TLS certificate issuer lookup
//!
//! Opens its own TLS connection to port 443, independent of the page fetch,
//! and reads the issuer organization of the leaf certificate. Best effort:
//! every failure yields `None`.

use crate::url::extract_domain;
use anyhow::{anyhow, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use url::Url;
use x509_parser::certificate::X509Certificate;

/// Port the issuer lookup connects to
pub const TLS_PORT: u16 = 443;

/// Timeout ceiling for connect plus handshake
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the issuer organization of the target host's certificate
///
/// Only `https` targets are inspected.
pub async fn lookup_issuer(target: &Url, timeout: Duration) -> Option<String> {
    if target.scheme() != "https" {
        return None;
    }
    let domain = extract_domain(target)?;
    let host = domain.trim_start_matches('[').trim_end_matches(']');

    match tokio::time::timeout(timeout.min(LOOKUP_TIMEOUT), fetch_issuer(host)).await {
        Ok(Ok(issuer)) => issuer,
        Ok(Err(e)) => {
            tracing::debug!("TLS issuer lookup for {} failed: {}", host, e);
            None
        }
        Err(_) => {
            tracing::debug!("TLS issuer lookup for {} timed out", host);
            None
        }
    }
}

/// Performs the handshake with certificate verification and parses the leaf
async fn fetch_issuer(host: &str) -> Result<Option<String>> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| anyhow!("Invalid server name {}: {}", host, e))?;

    let sock = TcpStream::connect((host, TLS_PORT)).await?;
    let connector = TlsConnector::from(Arc::new(config));
    let tls_stream = connector.connect(server_name, sock).await?;

    let (_, connection) = tls_stream.get_ref();
    let leaf = connection
        .peer_certificates()
        .and_then(|certs| certs.first())
        .ok_or_else(|| anyhow!("No peer certificate presented by {}", host))?;

    let (_, cert) = x509_parser::parse_x509_certificate(leaf.as_ref())?;
    Ok(issuer_organization(&cert))
}

/// Reads the first organization (O) attribute of the issuer name
pub fn issuer_organization(cert: &X509Certificate<'_>) -> Option<String> {
    cert.issuer()
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
}
