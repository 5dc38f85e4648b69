//! Integration tests for the fetch stage
//!
//! These tests use wiremock to create mock HTTP servers and check retry,
//! robots.txt and rate gate behavior against real HTTP traffic.

use ripple_lexicon::config::UserAgentConfig;
use ripple_lexicon::crawler::{
    build_http_client, FetchError, Fetcher, RateGate, RetryBackoff, RetryPolicy,
};
use ripple_lexicon::robots::CrawlPolicy;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const AGENT: &str = "TestBot";

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: AGENT.to_string(),
        crawler_version: "1.0".to_string(),
        contact_url: None,
    }
}

/// Creates a fetcher for the mock server with the given robots.txt content
fn create_fetcher(server: &MockServer, robots: &str, max_attempts: u32, backoff_base: Duration) -> Fetcher {
    let client = build_http_client(&user_agent(), Duration::from_secs(5)).expect("client");
    let policy = CrawlPolicy::parse(robots, &server.uri()).expect("policy");
    let retry = RetryPolicy::new(
        max_attempts,
        RetryBackoff::new(backoff_base, Duration::from_secs(10)),
    );

    Fetcher::new(
        client,
        Arc::new(policy),
        Arc::new(RateGate::unbounded()),
        AGENT,
        retry,
    )
}

/// Fails the first `failures` requests with a 500 and records when each request arrived
struct FlakyResponder {
    failures: usize,
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().unwrap();
        arrivals.push(Instant::now());
        if arrivals.len() <= self.failures {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200).set_body_string("finally")
        }
    }
}

#[tokio::test]
async fn test_server_errors_are_retried_with_backoff() {
    let mock_server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));

    // Two failures first, then success
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(FlakyResponder {
            failures: 2,
            arrivals: arrivals.clone(),
        })
        .expect(3)
        .mount(&mock_server)
        .await;

    let base = Duration::from_millis(100);
    let fetcher = create_fetcher(&mock_server, "", 3, base);
    let url = format!("{}/flaky", mock_server.uri());

    let body = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();

    assert_eq!(body, "finally");
    assert_eq!(fetcher.gate().granted(), 3);

    // base after the first failure, 2 * base after the second
    let arrivals = arrivals.lock().unwrap();
    assert_eq!(arrivals.len(), 3);
    let first_gap = arrivals[1] - arrivals[0];
    let second_gap = arrivals[2] - arrivals[1];
    assert!(first_gap >= base);
    assert!(second_gap >= base * 2);
    assert!(second_gap > first_gap);
}

#[tokio::test]
async fn test_transport_errors_are_retried() {
    // Nothing listens on a port we bound and released
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = build_http_client(&user_agent(), Duration::from_secs(5)).unwrap();
    let site = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
    let fetcher = Fetcher::new(
        client,
        Arc::new(CrawlPolicy::allow_all(site)),
        Arc::new(RateGate::unbounded()),
        AGENT,
        RetryPolicy::new(3, RetryBackoff::new(Duration::from_millis(5), Duration::from_millis(20))),
    );
    let url = format!("http://127.0.0.1:{}/article", port);

    match fetcher.fetch(&url, &CancellationToken::new()).await {
        Err(FetchError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::Transport { .. }));
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(fetcher.gate().granted(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, "", 3, Duration::from_millis(10));
    let url = format!("{}/missing", mock_server.uri());

    let result = fetcher.fetch(&url, &CancellationToken::new()).await;

    assert!(matches!(result, Err(FetchError::ClientStatus { status: 404, .. })));
    assert_eq!(fetcher.gate().granted(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_report_last_cause() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, "", 3, Duration::from_millis(5));
    let url = format!("{}/down", mock_server.uri());

    match fetcher.fetch(&url, &CancellationToken::new()).await {
        Err(FetchError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::ServerStatus { status: 503, .. }));
        }
        other => panic!("expected exhausted retries, got {:?}", other),
    }
    assert_eq!(fetcher.gate().granted(), 3);
}

#[tokio::test]
async fn test_disallowed_url_never_reaches_network() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let robots = "User-agent: *\nDisallow: /private\n";
    let fetcher = create_fetcher(&mock_server, robots, 3, Duration::from_millis(10));
    let url = format!("{}/private/report", mock_server.uri());

    let result = fetcher.fetch(&url, &CancellationToken::new()).await;

    assert!(matches!(result, Err(FetchError::PolicyDenied { .. })));
    assert_eq!(fetcher.gate().granted(), 0);
}

#[tokio::test]
async fn test_agent_specific_rules_apply_to_our_agent_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/open"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let robots = "User-agent: testbot\nDisallow: /bots\n\nUser-agent: *\nDisallow: /open-for-bots-only\n";
    let fetcher = create_fetcher(&mock_server, robots, 1, Duration::from_millis(10));

    let listed = format!("{}/bots/list", mock_server.uri());
    assert!(!fetcher.is_allowed(&listed));
    assert!(fetcher.policy().is_allowed(&listed, "OtherBot"));
    let body = fetcher
        .fetch(&format!("{}/open", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_request_carries_identifying_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header_exists("accept"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, "", 1, Duration::from_millis(10));
    let url = format!("{}/article", mock_server.uri());

    assert_eq!(fetcher.fetch(&url, &CancellationToken::new()).await.unwrap(), "hello");
}

#[tokio::test]
async fn test_cancellation_interrupts_backoff() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    // Backoff would wait ten seconds after the first failure
    let fetcher = create_fetcher(&mock_server, "", 3, Duration::from_secs(10));
    let url = format!("{}/slow", mock_server.uri());
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let result = fetcher.fetch(&url, &cancel).await;

    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_interrupts_slow_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let fetcher = create_fetcher(&mock_server, "", 1, Duration::from_millis(10));
    let url = format!("{}/stalled", mock_server.uri());
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let result = fetcher.fetch(&url, &cancel).await;

    assert!(matches!(result, Err(FetchError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_every_attempt_waits_for_the_gate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let client = build_http_client(&user_agent(), Duration::from_secs(5)).unwrap();
    let base = Url::parse(&mock_server.uri()).unwrap();
    // Five requests per second, burst of one
    let fetcher = Fetcher::new(
        client,
        Arc::new(CrawlPolicy::allow_all(base)),
        Arc::new(RateGate::new(5.0, 1)),
        AGENT,
        RetryPolicy::default(),
    );

    let cancel = CancellationToken::new();
    let start = Instant::now();
    for i in 0..3 {
        let url = format!("{}/page-{}", mock_server.uri(), i);
        fetcher.fetch(&url, &cancel).await.unwrap();
    }

    // First token is immediate, the next two take 200ms each
    assert!(start.elapsed() >= Duration::from_millis(380));
    assert_eq!(fetcher.gate().granted(), 3);
}
