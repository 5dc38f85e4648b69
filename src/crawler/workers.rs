//! Stage worker loops
//!
//! Each worker pulls from its input queue and pushes to its output queue or
//! the error sink. A worker returns when its input queue is closed and
//! drained, or when the cancellation token fires. Every queue operation and
//! every wait races against the token.

use crate::crawler::extractor::ContentExtractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::jobs::{ErrorTally, FetchResult, ItemError, ItemFailure, TextResult, UrlJob, WordCounts};
use crate::crawler::source::UrlSource;
use crate::state::{Aggregator, ItemStage};
use crate::url::is_same_site;
use crate::words::WordCounter;
use flume::{Receiver, Sender};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Receives the next item, or `None` once the queue is closed or the run is cancelled
async fn next<T>(input: &Receiver<T>, cancel: &CancellationToken) -> Option<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        item = input.recv_async() => item.ok(),
    }
}

/// Sends an item downstream; false if the run was cancelled or the queue is gone
async fn forward<T>(output: &Sender<T>, item: T, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = output.send_async(item) => sent.is_ok(),
    }
}

/// Feeds the URL queue from the source
///
/// Dropping `urls` on return closes the queue. A read failure is reported to
/// the error sink and cancels the whole run.
///
/// # Returns
///
/// The number of URLs queued
pub(crate) async fn read_urls(
    mut source: UrlSource,
    site: Url,
    urls: Sender<UrlJob>,
    errors: Sender<ItemError>,
    cancel: CancellationToken,
) -> u64 {
    let mut queued = 0u64;

    loop {
        let next_url = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next_url = source.next_url() => next_url,
        };

        let url = match next_url {
            Ok(Some(url)) => url,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed reading URL list {}: {}", source.describe(), e);
                let failure = ItemFailure::Source(e.to_string());
                forward(&errors, ItemError::new(source.describe(), ItemStage::Reading, failure), &cancel).await;
                cancel.cancel();
                break;
            }
        };

        if !is_same_site(&site, &url) {
            tracing::warn!("{} is outside {}; its robots.txt was not consulted", url, site);
        }

        if !forward(&urls, UrlJob { url }, &cancel).await {
            break;
        }

        queued += 1;
        if queued % 1000 == 0 {
            tracing::info!("Queued {} URLs...", queued);
        }
    }

    tracing::info!("Finished reading {} URLs", queued);
    queued
}

/// Fetch stage: URL → document body
///
/// Robots.txt refusals go straight to the error sink. Other fetch outcomes,
/// failed or not, are forwarded to the extraction stage. A fetch abandoned
/// by cancellation is dropped.
pub(crate) async fn fetch_worker(
    fetcher: Arc<Fetcher>,
    jobs: Receiver<UrlJob>,
    fetched: Sender<FetchResult>,
    errors: Sender<ItemError>,
    cancel: CancellationToken,
) {
    while let Some(UrlJob { url }) = next(&jobs, &cancel).await {
        let body = fetcher.fetch(&url, &cancel).await;

        let delivered = match body {
            Err(e) if e.is_cancelled() => break,
            Err(e) if e.is_policy_denied() => {
                forward(&errors, ItemError::new(url, ItemStage::Fetching, e), &cancel).await
            }
            body => forward(&fetched, FetchResult { url, body }, &cancel).await,
        };

        if !delivered {
            break;
        }
    }
    tracing::debug!("Fetch worker stopped");
}

/// Extraction stage: document body → editorial text
pub(crate) async fn extract_worker(
    extractor: Arc<dyn ContentExtractor>,
    fetched: Receiver<FetchResult>,
    texts: Sender<TextResult>,
    cancel: CancellationToken,
) {
    while let Some(FetchResult { url, body }) = next(&fetched, &cancel).await {
        let text = match body {
            Ok(body) => extractor.extract(&body).map_err(ItemFailure::from),
            Err(e) => Err(ItemFailure::from(e)),
        };

        if !forward(&texts, TextResult { url, text }, &cancel).await {
            break;
        }
    }
    tracing::debug!("Extract worker stopped");
}

/// Counting stage: text → validated word counts
///
/// Failures carried from earlier stages are reported to the error sink with
/// the stage where they happened.
pub(crate) async fn count_worker(
    counter: Arc<WordCounter>,
    texts: Receiver<TextResult>,
    counts: Sender<WordCounts>,
    errors: Sender<ItemError>,
    cancel: CancellationToken,
) {
    while let Some(TextResult { url, text }) = next(&texts, &cancel).await {
        let delivered = match text {
            Ok(text) => {
                let word_counts = WordCounts {
                    counts: counter.count(&text),
                    url,
                };
                forward(&counts, word_counts, &cancel).await
            }
            Err(failure) => {
                let stage = stage_of(&failure);
                forward(&errors, ItemError::new(url, stage, failure), &cancel).await
            }
        };

        if !delivered {
            break;
        }
    }
    tracing::debug!("Count worker stopped");
}

/// Aggregation stage: folds word counts into the global totals
///
/// # Returns
///
/// The number of items this worker aggregated
pub(crate) async fn aggregate_worker(
    aggregator: Arc<Aggregator>,
    counts: Receiver<WordCounts>,
    cancel: CancellationToken,
) -> u64 {
    let mut aggregated = 0;
    while let Some(item) = next(&counts, &cancel).await {
        tracing::trace!("Aggregating {} ({} words)", item.url, item.total());
        aggregator.add(item).await;
        aggregated += 1;
    }
    aggregated
}

/// Error sink: counts and logs per-item failures until every producer is gone
///
/// The collector does not watch the cancellation token; it stops when the
/// last sender is dropped, so nothing already queued is lost.
pub(crate) async fn collect_errors(errors: Receiver<ItemError>) -> ErrorTally {
    let mut tally = ErrorTally::default();

    while let Ok(error) = errors.recv_async().await {
        tally.record(&error.failure);
        match &error.failure {
            ItemFailure::Fetch(e) if e.is_policy_denied() => {
                tracing::info!("Skipping {} (disallowed by robots.txt)", error.url);
            }
            _ => tracing::warn!("Error #{}: {}", tally.total(), error),
        }
    }

    if tally.total() > 0 {
        tracing::warn!("Total errors encountered: {}", tally.total());
    }
    tally
}

fn stage_of(failure: &ItemFailure) -> ItemStage {
    match failure {
        ItemFailure::Fetch(_) => ItemStage::Fetching,
        ItemFailure::Extraction(_) => ItemStage::Extracting,
        ItemFailure::Source(_) => ItemStage::Reading,
    }
}
