//! Integration tests for the full pipeline
//!
//! These tests use wiremock to serve a small site and tempfile for the URL
//! list and word bank, then run the analysis end-to-end.

use ripple_lexicon::config::{Config, CrawlerConfig, InputConfig, UserAgentConfig};
use ripple_lexicon::crawler::{
    analyze, build_http_client, Fetcher, PipelineSettings, RateGate, RetryPolicy,
    SelectorExtractor, UrlSource,
};
use ripple_lexicon::robots::CrawlPolicy;
use ripple_lexicon::{Aggregator, Pipeline, WordBank, WordCounter, WorkerDistribution};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_A: &str = r#"<html><body>
<nav>Home Rust Deals</nav>
<article>
  <header><h1>Rust Crawler</h1></header>
  <div data-article-body="true"><p>Rust makes crawler code safe. Rust!</p></div>
</article>
</body></html>"#;

const ARTICLE_B: &str = r#"<html><body>
<div data-article-body="true">Safe code wins. Code review helps.</div>
</body></html>"#;

const NO_CONTENT: &str = "<html><body><nav>Rust code everywhere</nav></body></html>";

fn write_lines(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    for line in lines {
        writeln!(file, "{}", line).expect("write line");
    }
    file
}

fn word_bank_file() -> NamedTempFile {
    write_lines(&["Rust", "crawler", "code", "safe", "ab"].map(String::from))
}

/// Creates a test configuration reading the given input files
fn create_test_config(urls: &NamedTempFile, words: &NamedTempFile) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 5,
            max_attempts: 2,
            backoff_base_ms: 10,
            backoff_max_ms: 50,
            request_timeout_secs: 5,
            progress_interval_secs: 0,
            ..CrawlerConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        },
        input: InputConfig {
            urls_file: Some(urls.path().to_path_buf()),
            wordbank_file: Some(words.path().to_path_buf()),
        },
        ..Config::default()
    }
}

async fn mount_page(server: &MockServer, page: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .mount(server)
        .await;
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_full_run_counts_words_and_failures() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/robots.txt",
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
    )
    .await;
    mount_page(&mock_server, "/a", html(ARTICLE_A)).await;
    mount_page(&mock_server, "/b", html(ARTICLE_B)).await;
    mount_page(&mock_server, "/nocontent", html(NO_CONTENT)).await;
    mount_page(&mock_server, "/missing", ResponseTemplate::new(404)).await;
    Mock::given(method("GET"))
        .and(path_regex("^/private"))
        .respond_with(html(ARTICLE_A))
        .expect(0)
        .mount(&mock_server)
        .await;

    let urls = write_lines(&[
        "# test articles".to_string(),
        format!("{}/a", base),
        format!("{}/private/secret", base),
        String::new(),
        format!("{}/b", base),
        format!("{}/nocontent", base),
        format!("{}/missing", base),
    ]);
    let words = word_bank_file();
    let mut config = create_test_config(&urls, &words);
    config.output.top_words = 3;

    let report = analyze(&config, CancellationToken::new()).await.unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.total_items_processed, 2);
    assert_eq!(report.total_words_processed, 10);
    assert_eq!(report.unique_words, 4);

    let top: Vec<(&str, u64)> = report
        .top_words
        .iter()
        .map(|w| (w.word.as_str(), w.count))
        .collect();
    assert_eq!(top, vec![("code", 3), ("rust", 3), ("crawler", 2)]);

    assert_eq!(report.errors.policy_denied, 1);
    assert_eq!(report.errors.fetch, 1);
    assert_eq!(report.errors.extraction, 1);
    assert_eq!(report.errors.source, 0);
    assert_eq!(report.extraction_failures, 1);
}

#[tokio::test]
async fn test_transient_failures_recover_within_pipeline() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/robots.txt", ResponseTemplate::new(404)).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/b", html(ARTICLE_B)).await;

    let urls = write_lines(&[format!("{}/b", base)]);
    let words = word_bank_file();
    let config = create_test_config(&urls, &words);

    let report = analyze(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.total_items_processed, 1);
    assert_eq!(report.total_words_processed, 3);
    assert_eq!(report.errors.total(), 0);
}

#[tokio::test]
async fn test_empty_url_list_finishes_cleanly() {
    let urls = write_lines(&["# nothing to crawl".to_string(), String::new()]);
    let words = word_bank_file();
    let config = create_test_config(&urls, &words);

    let report = analyze(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.total_items_processed, 0);
    assert_eq!(report.total_words_processed, 0);
    assert!(report.top_words.is_empty());
    assert_eq!(report.errors.total(), 0);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_malformed_first_url_is_an_item_failure() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/robots.txt", ResponseTemplate::new(404)).await;
    mount_page(&mock_server, "/b", html(ARTICLE_B)).await;

    let urls = write_lines(&[
        "www.example.com/no-scheme".to_string(),
        format!("{}/b", mock_server.uri()),
    ]);
    let words = word_bank_file();
    let config = create_test_config(&urls, &words);

    let report = analyze(&config, CancellationToken::new()).await.unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.total_items_processed, 1);
    assert_eq!(report.total_words_processed, 3);
    assert_eq!(report.errors.fetch, 1);
    assert_eq!(report.errors.total(), 1);
}

#[tokio::test]
async fn test_list_without_usable_urls_counts_every_entry() {
    let urls = write_lines(&[
        "# nothing absolute below".to_string(),
        "www.example.com/no-scheme".to_string(),
        "not a url at all".to_string(),
    ]);
    let words = word_bank_file();
    let config = create_test_config(&urls, &words);

    let report = analyze(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(report.total_items_processed, 0);
    assert_eq!(report.errors.fetch, 2);
    assert!(!report.cancelled);
}

#[tokio::test]
async fn test_missing_word_bank_is_fatal() {
    let urls = write_lines(&["https://example.com/a".to_string()]);
    let words = word_bank_file();
    let mut config = create_test_config(&urls, &words);
    config.input.wordbank_file = Some("/nonexistent/words.txt".into());

    assert!(analyze(&config, CancellationToken::new()).await.is_err());
}

/// Builds a pipeline against the mock server with an allow-all policy
fn create_pipeline(server: &MockServer, workers: usize) -> (Pipeline, Arc<Aggregator>) {
    let user_agent = UserAgentConfig::default();
    let client = build_http_client(&user_agent, Duration::from_secs(30)).unwrap();
    let site = Url::parse(&server.uri()).unwrap();
    let fetcher = Fetcher::new(
        client,
        Arc::new(CrawlPolicy::allow_all(site)),
        Arc::new(RateGate::unbounded()),
        user_agent.crawler_name,
        RetryPolicy::default(),
    );

    let extractor = SelectorExtractor::new(&["[data-article-body='true']".to_string()]).unwrap();
    let counter = WordCounter::new(Arc::new(WordBank::from_words(["code", "safe"])));
    let aggregator = Arc::new(Aggregator::new());

    let pipeline = Pipeline::new(
        Arc::new(fetcher),
        Arc::new(extractor),
        Arc::new(counter),
        aggregator.clone(),
        WorkerDistribution::from_total(workers),
        PipelineSettings {
            progress_interval: Duration::from_millis(50),
            ..PipelineSettings::default()
        },
    );
    (pipeline, aggregator)
}

#[tokio::test]
async fn test_cancel_mid_run_terminates_without_deadlock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(html(ARTICLE_B))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/slow/"))
        .respond_with(html(ARTICLE_B).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    // Far more slow URLs than queue capacity, so every stage is busy or blocked
    let mut urls = vec![format!("{}/fast", base)];
    urls.extend((0..500).map(|i| format!("{}/slow/{}", base, i)));

    let (pipeline, aggregator) = create_pipeline(&mock_server, 10);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        pipeline.run(UrlSource::from_urls(urls), cancel),
    )
    .await
    .expect("pipeline did not shut down after cancellation");

    assert!(outcome.cancelled);
    let snapshot = aggregator.snapshot().await;
    assert!(snapshot.total_items <= 1);
    // Only the fast article can have been aggregated
    assert!(snapshot.total_words == 0 || snapshot.total_words == 3);
}

#[tokio::test]
async fn test_pre_cancelled_run_does_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(ARTICLE_B))
        .expect(0)
        .mount(&mock_server)
        .await;

    let urls = vec![format!("{}/a", mock_server.uri())];
    let (pipeline, aggregator) = create_pipeline(&mock_server, 3);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline.run(UrlSource::from_urls(urls), cancel),
    )
    .await
    .expect("pre-cancelled pipeline hung");

    assert!(outcome.cancelled);
    assert_eq!(outcome.errors.total(), 0);
    assert_eq!(aggregator.snapshot().await.total_items, 0);
}

#[tokio::test]
async fn test_many_items_across_many_workers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/doc/"))
        .respond_with(html(ARTICLE_B))
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = (0..200)
        .map(|i| format!("{}/doc/{}", mock_server.uri(), i))
        .collect();
    let (pipeline, aggregator) = create_pipeline(&mock_server, 20);

    let outcome = pipeline
        .run(UrlSource::from_urls(urls), CancellationToken::new())
        .await;

    assert!(!outcome.cancelled);
    assert_eq!(outcome.errors.total(), 0);

    let snapshot = aggregator.snapshot().await;
    assert_eq!(snapshot.total_items, 200);
    assert_eq!(snapshot.total_words, 600);
    let top = aggregator.top_words(2).await;
    assert_eq!(top[0].word, "code");
    assert_eq!(top[0].count, 400);
    assert_eq!(top[1].word, "safe");
    assert_eq!(top[1].count, 200);
}
