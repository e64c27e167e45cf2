use kensa::ethics::BackoffPolicy;
use kensa::fetcher::user_agent;
use kensa::{ErrorKind, Politeness, ScanRequest, Scanner, SecurityReport};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONTACT: &str = "ops@example.com";

/// No pre-fetch delay and millisecond backoff
fn fast_politeness() -> Politeness {
    Politeness {
        backoff: BackoffPolicy {
            base: Duration::from_millis(10),
            cap: Duration::from_millis(50),
        },
        ..Politeness::without_delay()
    }
}

fn scanner() -> Scanner {
    Scanner::new(fast_politeness())
}

fn request(server: &MockServer, page: &str) -> ScanRequest {
    ScanRequest::new(&format!("{}{}", server.uri(), page), CONTACT)
        .expect("Failed to build request")
        .with_timeout(Duration::from_secs(5))
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

const PAGE: &str = r##"<html><head>
    <title>Acme Portal</title>
    <meta name="description" content="Customer portal">
    <meta name="generator" content="WordPress 6.4">
    <script src="/assets/jquery.min.js"></script>
    <script>var leaked = "hidden@acme.test";</script>
</head><body>
    <a href="/about">About</a>
    <a href="/about">About again</a>
    <a href="https://other.test/partner">Partner</a>
    <a href="#top">Top</a>
    <a href="mailto:sales@acme.test">Mail</a>
    <p>Report issues to security@acme.test or support@acme.test.</p>
</body></html>"##;

#[tokio::test]
async fn test_full_scan_success() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/portal"))
        .and(header("user-agent", user_agent(CONTACT).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .insert_header("content-type", "text/html")
                .insert_header("server", "nginx/1.25")
                .insert_header("x-powered-by", "Express")
                .insert_header("content-security-policy", "default-src 'self'")
                .insert_header("X-Frame-Options", "DENY"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/.well-known/security.txt"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/portal")).await;
    let base = server.uri();

    assert_eq!(report.error, None, "unexpected error report: {:?}", report.error);
    assert_eq!(report.status_code, 200);
    assert!(report.ssl_verified);
    assert_eq!(report.title.as_deref(), Some("Acme Portal"));
    assert_eq!(report.meta_description.as_deref(), Some("Customer portal"));
    assert_eq!(report.generator.as_deref(), Some("WordPress 6.4"));
    assert_eq!(report.server.as_deref(), Some("nginx/1.25"));
    assert_eq!(report.powered_by.as_deref(), Some("Express"));

    // Case-insensitive classification, canonical keys
    assert_eq!(
        report
            .security_headers
            .get("Content-Security-Policy")
            .map(String::as_str),
        Some("default-src 'self'")
    );
    assert!(report.security_headers.contains_key("X-Frame-Options"));
    assert_eq!(
        report.missing_important_headers,
        vec!["Strict-Transport-Security", "X-Content-Type-Options"]
    );
    assert!(report.has_critical_missing_headers());

    assert_eq!(report.js_framework_hints, vec!["jQuery"]);
    assert_eq!(
        report.extracted_emails,
        vec!["security@acme.test", "support@acme.test"]
    );

    assert_eq!(report.internal_links, vec![format!("{}/about", base)]);
    assert_eq!(report.external_links, vec!["https://other.test/partner"]);
    assert_eq!(report.internal_links_count, 1);
    assert_eq!(report.external_links_count, 1);

    assert!(report.has_security_txt);
    assert_eq!(
        report.security_txt_url,
        Some(format!("{}/.well-known/security.txt", base))
    );
    // Plain http target: no certificate to inspect
    assert_eq!(report.ssl_issuer, None);
}

#[tokio::test]
async fn test_security_txt_fallback_location() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/security.txt"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/")).await;
    assert!(report.has_security_txt);
    assert_eq!(
        report.security_txt_url,
        Some(format!("{}/security.txt", server.uri()))
    );
}

#[tokio::test]
async fn test_robots_disallow_blocks_fetch() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /private").await;

    Mock::given(method("GET"))
        .and(path("/private/area"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/private/area")).await;

    assert_eq!(report.error.as_deref(), Some("Disallowed by robots.txt"));
    assert_eq!(report.error_kind, Some(ErrorKind::PolicyDisallowed));
    assert_eq!(report.status_code, 0);
    assert!(!report.ssl_verified);
    assert!(report.security_headers.is_empty());
    assert!(report.internal_links.is_empty());
    assert!(report.extracted_emails.is_empty());
}

#[tokio::test]
async fn test_robots_group_for_product_token() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: Kensa\nDisallow: /\n\nUser-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/")).await;
    assert_eq!(report.error_kind, Some(ErrorKind::PolicyDisallowed));
}

#[tokio::test]
async fn test_ignore_robots_skips_policy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Open</title>"))
        .mount(&server)
        .await;

    let report = scanner()
        .run(request(&server, "/").with_respect_robots(false))
        .await;
    assert_eq!(report.error, None);
    assert_eq!(report.title.as_deref(), Some("Open"));
}

async fn mount_robots_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_robots_server_error_blocks_scan() {
    let server = MockServer::start().await;
    mount_robots_status(&server, 500).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Up</title>"))
        .expect(0)
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/")).await;
    assert_eq!(report.error_kind, Some(ErrorKind::PolicyDisallowed));
    assert_eq!(report.status_code, 0);
}

#[tokio::test]
async fn test_robots_forbidden_blocks_scan() {
    for status in [401, 403, 503] {
        let server = MockServer::start().await;
        mount_robots_status(&server, status).await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let report = scanner().run(request(&server, "/")).await;
        assert_eq!(
            report.error_kind,
            Some(ErrorKind::PolicyDisallowed),
            "robots.txt status {}",
            status
        );
    }
}

#[tokio::test]
async fn test_robots_not_found_allows_scan() {
    let server = MockServer::start().await;
    mount_robots_status(&server, 404).await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Up</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/")).await;
    assert_eq!(report.error, None);
    assert_eq!(report.status_code, 200);
}

#[tokio::test]
async fn test_unrepresentable_crawl_delay_ignored() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nCrawl-delay: 1e30\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Up</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let report = scanner().run(request(&server, "/")).await;
    assert_eq!(report.error, None);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_rate_limit_then_success() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Recovered</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/")).await;
    assert_eq!(report.error, None);
    assert_eq!(report.title.as_deref(), Some("Recovered"));
}

#[tokio::test]
async fn test_persistent_rate_limit_exhausts_retries() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let report = scanner()
        .run(request(&server, "/").with_max_retries(2))
        .await;

    assert_eq!(report.error_kind, Some(ErrorKind::TransientHttp));
    assert_eq!(report.status_code, 503);
    assert!(report.security_headers.is_empty());
}

#[tokio::test]
async fn test_definitive_http_error_not_retried() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not Found</title>"))
        .expect(1)
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/missing")).await;

    assert_eq!(report.error.as_deref(), Some("HTTP error 404"));
    assert_eq!(report.error_kind, Some(ErrorKind::DefinitiveHttp));
    assert_eq!(report.status_code, 404);
    assert_eq!(report.title, None);
}

#[tokio::test]
async fn test_timeout_retried_then_reported() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(2)
        .mount(&server)
        .await;

    let started = Instant::now();
    let report = scanner()
        .run(
            request(&server, "/slow")
                .with_timeout(Duration::from_millis(300))
                .with_max_retries(2),
        )
        .await;

    assert_eq!(report.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(report.status_code, 0);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_redirect_followed_and_links_resolved_against_final_url() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/new"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="intro">Intro</a>"#))
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/old")).await;

    assert_eq!(report.error, None);
    assert_eq!(report.url, format!("{}/old", server.uri()));
    assert_eq!(report.internal_links, vec![format!("{}/docs/intro", server.uri())]);
}

#[cfg(not(feature = "browser"))]
#[tokio::test]
async fn test_rendered_without_browser_runtime() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let report = scanner()
        .run(request(&server, "/").with_strategy(kensa::Strategy::Rendered))
        .await;

    assert_eq!(report.error_kind, Some(ErrorKind::PipelineUnavailable));
    assert_eq!(report.status_code, 0);
    assert!(!report.ssl_verified);
}

#[tokio::test]
async fn test_cancellation_during_fetch() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let report = scanner()
        .with_cancellation(cancel)
        .run(request(&server, "/").with_timeout(Duration::from_secs(30)))
        .await;

    assert_eq!(report.error.as_deref(), Some("Scan cancelled"));
    assert_eq!(report.error_kind, Some(ErrorKind::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_during_politeness_delay() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    // Default politeness waits at least 2.5s before fetching
    let report = Scanner::default()
        .with_cancellation(cancel)
        .run(request(&server, "/"))
        .await;

    assert_eq!(report.error_kind, Some(ErrorKind::Cancelled));
}

#[tokio::test]
async fn test_repeat_scans_identical_except_timestamp() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PAGE)
                .insert_header("strict-transport-security", "max-age=63072000"),
        )
        .mount(&server)
        .await;

    let first = scanner().run(request(&server, "/")).await;
    let mut second = scanner().run(request(&server, "/")).await;

    second.timestamp = first.timestamp;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_report_json_round_trip() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;

    let report = scanner().run(request(&server, "/")).await;
    let json = report.to_json_pretty().expect("Failed to serialize");
    let back: SecurityReport = serde_json::from_str(&json).expect("Failed to parse");
    assert_eq!(back, report);
}
