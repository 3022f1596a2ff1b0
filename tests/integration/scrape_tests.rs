//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! scrape pipeline end-to-end: validation, quota, robots.txt, fetch,
//! extraction and quota accounting.

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use webscraper::config::{parse_config, Config};
use webscraper::quota::Owner;
use webscraper::scrape::FetchError;
use webscraper::storage::{KvStore, MemoryStore, PutOptions, SqliteStore};
use webscraper::{OwnerType, ScrapeError, ScrapeInput, Scraper};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCENARIO_HTML: &str = r#"<html><head><title>Test Title</title><meta name="description" content="Test Description"></head><body><p>First paragraph</p><p>Second paragraph</p></body></html>"#;

/// Creates a test configuration that can reach the loopback mock server
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.user_agent.crawler_name = "TestBot".to_string();
    // Mock servers listen on 127.0.0.1, which the default blocklist rejects
    config.validation.blocked_domains = vec!["blocked.test".to_string()];
    config
}

fn create_scraper(config: Config) -> Scraper<Arc<MemoryStore>> {
    Scraper::new(config, Arc::new(MemoryStore::new())).expect("Failed to create scraper")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(response)
        .mount(server)
        .await;
}

fn seed_usage<S: KvStore>(scraper: &Scraper<S>, owner: &Owner, count: u32) {
    let reset_at = (Utc::now() + ChronoDuration::hours(12)).timestamp_millis();
    scraper
        .ledger()
        .store()
        .put(
            &scraper.ledger().key(owner),
            &format!(r#"{{"count":{},"resetAt":{}}}"#, count, reset_at),
            PutOptions::default(),
        )
        .expect("Failed to seed usage");
}

#[tokio::test]
async fn test_full_scrape_scenario() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let scraper = create_scraper(create_test_config());
    let owner = Owner::guest("guest-1");
    seed_usage(&scraper, &owner, 2);

    let outcome = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "guest-1",
        )
        .await
        .expect("Scrape failed");

    let result = &outcome.result;
    assert_eq!(result.title, "Test Title");
    assert_eq!(result.description.as_deref(), Some("Test Description"));
    let first = result.text.find("First paragraph").expect("missing first");
    let second = result.text.find("Second paragraph").expect("missing second");
    assert!(first < second);
    assert!(result.robots_txt_allowed);
    assert_eq!(result.metadata.charset, "UTF-8");

    assert!(outcome.usage.used >= 3);
    assert_eq!(outcome.usage.limit, 5);
    assert!(outcome.usage.reset_at.is_some());
}

#[tokio::test]
async fn test_links_are_resolved_against_page() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/",
        html(&format!(
            r##"<html><body>
            <a href="/page1">One</a>
            <a href="{base}/page2">Two</a>
            <a href="/page1">Duplicate</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a href="#top">Top</a>
            </body></html>"##
        )),
    )
    .await;

    let scraper = create_scraper(create_test_config());
    let outcome = scraper
        .scrape(&ScrapeInput::new(format!("{}/", base)), OwnerType::User, "u")
        .await
        .expect("Scrape failed");

    assert_eq!(
        outcome.result.links,
        vec![format!("{}/page1", base), format!("{}/page2", base)]
    );
    assert_eq!(outcome.result.title, "Untitled Page");
    assert_eq!(outcome.usage.used, 1);
    assert_eq!(outcome.usage.limit, 100);
}

#[tokio::test]
async fn test_links_and_images_are_capped() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let mut body = String::from("<html><body>");
    for i in 0..30 {
        body.push_str(&format!(r#"<a href="/p{}">p</a><img src="/i{}.png">"#, i % 20, i));
    }
    body.push_str("</body></html>");
    mount_page(&mock_server, "/", html(&body)).await;

    let mut config = create_test_config();
    config.extraction.max_links = 10;
    config.extraction.max_images = 4;
    let scraper = create_scraper(config);

    let outcome = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::User,
            "u",
        )
        .await
        .expect("Scrape failed");

    let links = &outcome.result.links;
    assert_eq!(links.len(), 10);
    let mut unique = links.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), links.len());
    assert_eq!(outcome.result.images.len(), 4);
}

#[tokio::test]
async fn test_declared_user_agent_is_sent() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0 (+https://example.com/bot)"))
        .respond_with(html(SCENARIO_HTML))
        .expect(1)
        .mount(&mock_server)
        .await;

    let scraper = create_scraper(create_test_config());
    scraper
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .expect("Scrape failed");
}

#[tokio::test]
async fn test_non_http_scheme_makes_no_requests() {
    let mock_server = MockServer::start().await;

    // Should never be called
    Mock::given(method("GET"))
        .respond_with(html(SCENARIO_HTML))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = create_scraper(create_test_config());
    let host = mock_server.address().to_string();

    for url in [
        format!("ftp://{}/file", host),
        format!("file://{}/etc/passwd", host),
        "javascript:alert(1)".to_string(),
    ] {
        let err = scraper
            .scrape(&ScrapeInput::new(url.clone()), OwnerType::Guest, "g")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error", "url: {}", url);
    }
}

#[tokio::test]
async fn test_blocked_domain_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(SCENARIO_HTML))
        .expect(0)
        .mount(&mock_server)
        .await;

    // Default blocklist includes 127.0.0.1
    let scraper = create_scraper(Config::default());
    let err = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "validation_error");
    assert!(matches!(err, ScrapeError::Validation(_)));
}

#[tokio::test]
async fn test_exhausted_quota_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(SCENARIO_HTML))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = create_scraper(create_test_config());
    let owner = Owner::guest("heavy");
    seed_usage(&scraper, &owner, 5);

    let err = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "heavy",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "quota_exceeded");
    let usage = err.usage().expect("quota error carries usage");
    assert_eq!(usage.used, 5);
    assert_eq!(usage.limit, 5);
}

#[tokio::test]
async fn test_robots_disallow_blocks() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nDisallow: /admin").await;

    // Should never be called
    Mock::given(method("GET"))
        .and(path("/admin/x"))
        .respond_with(html(SCENARIO_HTML))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = create_scraper(create_test_config());
    let err = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/admin/x", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "robots_txt_blocked");
    assert_eq!(scraper.ledger().usage(&Owner::guest("g")).usage().used, 0);
}

#[tokio::test]
async fn test_robots_agent_specific_rule() {
    let mock_server = MockServer::start().await;
    mount_robots(
        &mock_server,
        "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /",
    )
    .await;
    mount_page(&mock_server, "/page", html(SCENARIO_HTML)).await;

    let url = format!("{}/page", mock_server.uri());

    let err = create_scraper(create_test_config())
        .scrape(&ScrapeInput::new(url.clone()), OwnerType::Guest, "g")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "robots_txt_blocked");

    // Another agent falls through to the wildcard rule
    let mut config = create_test_config();
    config.user_agent.crawler_name = "OtherBot".to_string();
    let outcome = create_scraper(config)
        .scrape(&ScrapeInput::new(url), OwnerType::Guest, "g")
        .await
        .expect("Scrape failed");
    assert_eq!(outcome.result.title, "Test Title");
}

#[tokio::test]
async fn test_robots_allow_all() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/admin/x", html(SCENARIO_HTML)).await;

    let outcome = create_scraper(create_test_config())
        .scrape(
            &ScrapeInput::new(format!("{}/admin/x", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .expect("Scrape failed");

    assert!(outcome.result.robots_txt_allowed);
}

#[tokio::test]
async fn test_missing_robots_is_allowed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let outcome = create_scraper(create_test_config())
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .expect("Scrape failed");

    assert!(outcome.result.robots_txt_allowed);
}

#[tokio::test]
async fn test_failing_robots_is_allowed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let mut config = create_test_config();
    config.scraper.robots_timeout_ms = 200;

    let outcome = create_scraper(config)
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .expect("Scrape failed");

    assert_eq!(outcome.result.title, "Test Title");
}

#[tokio::test]
async fn test_robots_not_fetched_when_disabled() {
    let mock_server = MockServer::start().await;

    // Should never be called
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let mut config = create_test_config();
    config.scraper.respect_robots_txt = false;

    let outcome = create_scraper(config)
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .expect("Scrape failed");

    assert!(outcome.result.robots_txt_allowed);
}

#[tokio::test]
async fn test_non_html_is_fetch_error() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/data.json",
        ResponseTemplate::new(200).set_body_raw(r#"{"ok":true}"#, "application/json"),
    )
    .await;

    let scraper = create_scraper(create_test_config());
    let err = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/data.json", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "fetch_error");
    assert!(matches!(err, ScrapeError::Fetch(FetchError::ContentType(_))));
    assert_eq!(scraper.ledger().usage(&Owner::guest("g")).usage().used, 0);
}

#[tokio::test]
async fn test_error_status_is_fetch_error() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/broken", ResponseTemplate::new(500)).await;

    let err = create_scraper(create_test_config())
        .scrape(
            &ScrapeInput::new(format!("{}/broken", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Fetch(FetchError::Status { status: 500 })
    ));
}

#[tokio::test]
async fn test_oversized_body_is_fetch_error() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    let big = format!("<html><body><p>{}</p></body></html>", "x".repeat(4096));
    mount_page(&mock_server, "/big", html(&big)).await;

    let mut config = create_test_config();
    config.scraper.max_response_size = 1024;

    let err = create_scraper(config)
        .scrape(
            &ScrapeInput::new(format!("{}/big", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "fetch_error");
    assert!(matches!(
        err,
        ScrapeError::Fetch(FetchError::TooLarge { max: 1024, .. })
    ));
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/slow",
        html(SCENARIO_HTML).set_delay(Duration::from_secs(5)),
    )
    .await;

    let mut config = create_test_config();
    config.scraper.fetch_timeout_ms = 200;

    let started = Instant::now();
    let err = create_scraper(config)
        .scrape(
            &ScrapeInput::new(format!("{}/slow", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScrapeError::Fetch(FetchError::Timeout { timeout_ms: 200 })
    ));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_cancellation_stops_pending_fetch() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/slow",
        html(SCENARIO_HTML).set_delay(Duration::from_secs(5)),
    )
    .await;

    let scraper = create_scraper(create_test_config());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = scraper
        .scrape_with_cancellation(
            &ScrapeInput::new(format!("{}/slow", mock_server.uri())),
            OwnerType::Guest,
            "g",
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(FetchError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(scraper.ledger().usage(&Owner::guest("g")).usage().used, 0);
}

#[tokio::test]
async fn test_redirect_is_followed_and_reported() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()),
    )
    .await;
    mount_page(
        &mock_server,
        "/new",
        html(r#"<html><head><title>Moved</title></head><body><a href="next">n</a></body></html>"#),
    )
    .await;

    let outcome = create_scraper(create_test_config())
        .scrape(&ScrapeInput::new(format!("{}/old", base)), OwnerType::Guest, "g")
        .await
        .expect("Scrape failed");

    assert_eq!(outcome.result.title, "Moved");
    assert_eq!(outcome.result.url, format!("{}/new", base));
    assert_eq!(outcome.result.links, vec![format!("{}/next", base)]);
}

#[tokio::test]
async fn test_redirect_to_blocked_host_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(
        &mock_server,
        "/escape",
        ResponseTemplate::new(302).insert_header("location", "http://blocked.test/secret"),
    )
    .await;

    let err = create_scraper(create_test_config())
        .scrape(
            &ScrapeInput::new(format!("{}/escape", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "fetch_error");
    assert!(matches!(err, ScrapeError::Fetch(FetchError::Network(_))));
}

#[tokio::test]
async fn test_redirect_into_disallowed_path_is_blocked() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_robots(&mock_server, "User-agent: *\nDisallow: /private").await;
    mount_page(
        &mock_server,
        "/public",
        ResponseTemplate::new(302).insert_header("location", format!("{}/private", base).as_str()),
    )
    .await;
    mount_page(
        &mock_server,
        "/private",
        html(r#"<html><head><title>Private</title></head><body>secret</body></html>"#),
    )
    .await;

    let scraper = create_scraper(create_test_config());
    let err = scraper
        .scrape(&ScrapeInput::new(format!("{}/public", base)), OwnerType::Guest, "g")
        .await
        .unwrap_err();

    assert_eq!(err.code(), "robots_txt_blocked");
    assert!(err.to_string().contains("/private"));
    assert_eq!(scraper.ledger().usage(&Owner::guest("g")).usage().used, 0);
}

#[tokio::test]
async fn test_disabled_scraper_makes_no_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(SCENARIO_HTML))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config();
    config.scraper.enabled = false;

    let err = create_scraper(config)
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::User,
            "u",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "feature_disabled");
}

#[tokio::test]
async fn test_quota_accumulates_until_exhausted() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let mut config = create_test_config();
    config.quota.guest_daily_limit = 2;
    let scraper = create_scraper(config);
    let input = ScrapeInput::new(format!("{}/", mock_server.uri()));

    let first = scraper.scrape(&input, OwnerType::Guest, "g").await.unwrap();
    let second = scraper.scrape(&input, OwnerType::Guest, "g").await.unwrap();
    assert_eq!(first.usage.used, 1);
    assert_eq!(second.usage.used, 2);
    assert_eq!(first.usage.reset_at, second.usage.reset_at);

    let err = scraper.scrape(&input, OwnerType::Guest, "g").await.unwrap_err();
    assert_eq!(err.code(), "quota_exceeded");

    // Other owners are unaffected
    let other = scraper.scrape(&input, OwnerType::Guest, "h").await.unwrap();
    assert_eq!(other.usage.used, 1);
}

#[tokio::test]
async fn test_sqlite_store_keeps_quota() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let dir = tempfile::TempDir::new().unwrap();
    let db_path = dir.path().join("quota.db");
    let input = ScrapeInput::new(format!("{}/", mock_server.uri()));

    {
        let store = SqliteStore::new(&db_path).expect("Failed to open DB");
        let scraper = Scraper::new(create_test_config(), store).unwrap();
        let outcome = scraper.scrape(&input, OwnerType::User, "42").await.unwrap();
        assert_eq!(outcome.usage.used, 1);
    }

    let store = SqliteStore::new(&db_path).expect("Failed to reopen DB");
    let scraper = Scraper::new(create_test_config(), store).unwrap();
    let outcome = scraper.scrape(&input, OwnerType::User, "42").await.unwrap();
    assert_eq!(outcome.usage.used, 2);
}

#[tokio::test]
async fn test_config_file_drives_scraper() {
    let mock_server = MockServer::start().await;
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_page(&mock_server, "/", html(SCENARIO_HTML)).await;

    let config = parse_config(
        r#"
        [scraper]
        fetch-timeout-ms = 2000

        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "2.0"
        contact-url = "https://example.com/contact"

        [validation]
        blocked-domains = ["metadata.google.internal"]

        [extraction]
        max-title-length = 4

        [quota]
        namespace = "test_quota"
        "#,
    )
    .expect("Failed to parse config");

    let scraper = create_scraper(config);
    let outcome = scraper
        .scrape(
            &ScrapeInput::new(format!("{}/", mock_server.uri())),
            OwnerType::Guest,
            "g",
        )
        .await
        .expect("Scrape failed");

    assert_eq!(outcome.result.title, "Test");
    assert_eq!(scraper.ledger().key(&Owner::guest("g")), "test_quota:guest:g");
}
