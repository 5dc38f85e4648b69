//! Crawler module for fetching and processing documents
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with robots.txt checks, rate limiting and retries
//! - Editorial text extraction
//! - The staged worker pipeline and its shutdown cascade

mod coordinator;
mod extractor;
mod fetcher;
mod jobs;
mod rate_gate;
mod retry_backoff;
mod source;
mod workers;

pub use coordinator::{Pipeline, PipelineOutcome, PipelineSettings, WorkerDistribution};
pub use extractor::{ContentExtractor, ExtractionError, SelectorExtractor};
pub use fetcher::{build_http_client, FetchError, Fetcher, RetryPolicy};
pub use jobs::{ErrorTally, FetchResult, ItemError, ItemFailure, TextResult, UrlJob, WordCounts};
pub use rate_gate::{GateError, RateGate, MAX_CRAWL_DELAY};
pub use retry_backoff::{RetryBackoff, RetrySchedule};
pub use source::{discover_site, SiteDiscovery, UrlSource};

use crate::config::Config;
use crate::output::Report;
use crate::robots::load_policy;
use crate::state::Aggregator;
use crate::url::site_origin;
use crate::words::{WordBank, WordCounter};
use crate::{ConfigError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a complete analysis
///
/// This is the main entry point for a run. It will:
/// 1. Load the word bank and compile the content selectors
/// 2. Build the HTTP client
/// 3. Load robots.txt for the target site and configure the rate gate
/// 4. Run every listed URL through the pipeline
/// 5. Assemble the report from whatever was aggregated
///
/// Per-item failures are counted in the report. Cancellation ends the run
/// early and still produces a (partial) report.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `cancel` - Shutdown signal
///
/// # Returns
///
/// * `Ok(Report)` - The run finished or was cancelled
/// * `Err(LexiconError)` - A startup input was missing or invalid
pub async fn analyze(config: &Config, cancel: CancellationToken) -> Result<Report> {
    crate::config::validate_input_files(&config.input)?;
    let urls_file = config
        .input
        .urls_file
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("urls-file is required".to_string()))?;
    let wordbank_file = config
        .input
        .wordbank_file
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("wordbank-file is required".to_string()))?;

    let word_bank = WordBank::load(wordbank_file).await?;
    let counter = Arc::new(WordCounter::new(Arc::new(word_bank)));
    let extractor = Arc::new(SelectorExtractor::new(&config.extraction.selectors)?);
    let aggregator = Arc::new(Aggregator::new());
    let top_n = config.output.top_words;

    let crawler = &config.crawler;
    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(crawler.request_timeout_secs),
    )?;

    let site = match &config.site.base_url {
        Some(base) => site_origin(base)?,
        None => {
            let discovery = discover_site(urls_file).await?;
            match discovery.site {
                Some(site) => site,
                None => {
                    let report =
                        report_without_site(&aggregator, urls_file, discovery.skipped, top_n).await;
                    return Ok(report);
                }
            }
        }
    };
    tracing::info!("Target site: {}", site);

    let agent = config.user_agent.crawler_name.clone();
    let policy = load_policy(&client, &site, &cancel).await;

    let gate = RateGate::for_run(crawler.rate_limit, crawler.burst, policy.crawl_delay(&agent));
    let retry = RetryPolicy::new(
        crawler.max_attempts,
        RetryBackoff::new(
            Duration::from_millis(crawler.backoff_base_ms),
            Duration::from_millis(crawler.backoff_max_ms),
        ),
    );
    let fetcher = Arc::new(Fetcher::new(
        client,
        Arc::new(policy),
        Arc::new(gate),
        agent,
        retry,
    ));

    let source = UrlSource::open(urls_file).await?;
    let pipeline = Pipeline::new(
        fetcher,
        extractor.clone(),
        counter,
        aggregator.clone(),
        WorkerDistribution::from_total(crawler.workers),
        PipelineSettings::from_config(config),
    );

    let outcome = pipeline.run(source, cancel).await;
    Ok(Report::build(&aggregator, &outcome, extractor.failure_count(), top_n).await)
}

/// Report for a list with no usable URL to derive the site from
///
/// Nothing is fetched; every listed entry counts as a failed fetch.
async fn report_without_site(
    aggregator: &Aggregator,
    urls_file: &Path,
    invalid: u64,
    top_n: usize,
) -> Report {
    if invalid == 0 {
        tracing::info!("URL list {} is empty, nothing to do", urls_file.display());
    } else {
        tracing::warn!(
            "URL list {} has no usable http(s) URL; {} entries counted as failed",
            urls_file.display(),
            invalid
        );
    }

    let outcome = PipelineOutcome {
        errors: ErrorTally {
            fetch: invalid,
            ..ErrorTally::default()
        },
        cancelled: false,
    };
    Report::build(aggregator, &outcome, 0, top_n).await
}
