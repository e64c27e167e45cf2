use kensa::{ErrorKind, Politeness, ScanRequest, Scanner};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// Starts a TLS server presenting a self-signed certificate for `localhost`
///
/// Returns the bound port and the number of accepted connections.
async fn start_self_signed_server() -> (u16, Arc<AtomicUsize>) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .expect("Failed to generate certificate");
    let key = PrivateKeyDer::from(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .expect("Failed to build server config");
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let port = listener.local_addr().expect("No local address").port();

    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // The client aborts the handshake; the outcome is irrelevant here
                let _ = acceptor.accept(stream).await;
            });
        }
    });

    (port, accepted)
}

#[tokio::test]
async fn test_untrusted_certificate_reported_without_retry() {
    let (port, accepted) = start_self_signed_server().await;

    let request = ScanRequest::new(&format!("https://localhost:{}/", port), "ops@example.com")
        .expect("Failed to build request")
        .with_respect_robots(false)
        .with_max_retries(3)
        .with_timeout(Duration::from_secs(5));

    let report = Scanner::new(Politeness::without_delay()).run(request).await;

    assert_eq!(report.error_kind, Some(ErrorKind::Certificate));
    assert!(report.error.is_some());
    assert!(!report.ssl_verified);
    assert_eq!(report.ssl_issuer, None);
    assert_eq!(report.status_code, 0);
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}
