//! Pipeline coordinator - wires the stages together
//!
//! This module builds the bounded queues between stages, starts the worker
//! pools, and manages shutdown:
//! - Each stage closes its output queue once all of its workers have exited
//! - Cancellation is observed by every worker at every suspension point
//! - The run finishes when the aggregator and the error collector are done

use crate::config::{Config, QueueConfig};
use crate::crawler::extractor::ContentExtractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::jobs::ErrorTally;
use crate::crawler::source::UrlSource;
use crate::crawler::workers::{
    aggregate_worker, collect_errors, count_worker, extract_worker, fetch_worker, read_urls,
};
use crate::state::{Aggregator, ItemStage};
use crate::words::WordCounter;
use flume::Sender;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Number of workers per pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerDistribution {
    pub fetchers: usize,
    pub parsers: usize,
    pub counters: usize,
}

impl WorkerDistribution {
    /// Splits a worker total 60/20/20 across fetch, extract and count
    ///
    /// Fetching is I/O bound and gets the largest share. Every stage gets at
    /// least one worker; the remainder goes to counting.
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_lexicon::WorkerDistribution;
    ///
    /// let split = WorkerDistribution::from_total(50);
    /// assert_eq!((split.fetchers, split.parsers, split.counters), (30, 10, 10));
    /// ```
    pub fn from_total(total: usize) -> Self {
        let fetchers = (total * 60 / 100).max(1);
        let parsers = (total * 20 / 100).max(1);
        let counters = total.saturating_sub(fetchers + parsers).max(1);
        Self {
            fetchers,
            parsers,
            counters,
        }
    }

    pub fn total(&self) -> usize {
        self.fetchers + self.parsers + self.counters
    }
}

/// Queue capacities and periodic reporting for a run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub queues: QueueConfig,
    /// Interval between progress log lines (zero disables them)
    pub progress_interval: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queues: QueueConfig::default(),
            progress_interval: Duration::from_secs(10),
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queues: config.queues.clone(),
            progress_interval: Duration::from_secs(config.crawler.progress_interval_secs),
        }
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// Per-item failures by class
    pub errors: ErrorTally,
    /// True if the run was cut short by cancellation
    pub cancelled: bool,
}

/// The staged crawl pipeline
pub struct Pipeline {
    fetcher: Arc<Fetcher>,
    extractor: Arc<dyn ContentExtractor>,
    counter: Arc<WordCounter>,
    aggregator: Arc<Aggregator>,
    workers: WorkerDistribution,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Creates a pipeline from its collaborators
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher carrying the loaded policy and configured rate gate
    /// * `extractor` - Text extraction strategy
    /// * `counter` - Tokenizer bound to the word bank
    /// * `aggregator` - Shared totals; read it after [`Pipeline::run`] to build a report
    /// * `workers` - Workers per stage
    /// * `settings` - Queue capacities and progress interval
    pub fn new(
        fetcher: Arc<Fetcher>,
        extractor: Arc<dyn ContentExtractor>,
        counter: Arc<WordCounter>,
        aggregator: Arc<Aggregator>,
        workers: WorkerDistribution,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            counter,
            aggregator,
            workers,
            settings,
        }
    }

    /// Runs every URL from `source` through the pipeline
    ///
    /// Returns once the aggregator has drained its queue (or been cancelled)
    /// and the error collector has seen every reported failure. Per-item
    /// failures never abort the run.
    ///
    /// # Arguments
    ///
    /// * `source` - The URL list
    /// * `cancel` - Shutdown signal; also fired by a fatal source read error
    pub async fn run(self, source: UrlSource, cancel: CancellationToken) -> PipelineOutcome {
        let Self {
            fetcher,
            extractor,
            counter,
            aggregator,
            workers,
            settings,
        } = self;
        let queues = &settings.queues;

        tracing::info!(
            "Starting pipeline with {} fetchers, {} parsers, {} counters",
            workers.fetchers,
            workers.parsers,
            workers.counters
        );

        let (url_tx, url_rx) = flume::bounded(queues.urls);
        let (fetched_tx, fetched_rx) = flume::bounded(queues.fetched);
        let (text_tx, text_rx) = flume::bounded(queues.texts);
        let (count_tx, count_rx) = flume::bounded(queues.counts);
        let (error_tx, error_rx) = flume::bounded(queues.errors);

        let collector = tokio::spawn(
            collect_errors(error_rx).instrument(tracing::info_span!("stage", stage = "errors")),
        );

        let site = fetcher.policy().base_url().clone();
        let reader = tokio::spawn(
            read_urls(source, site, url_tx, error_tx.clone(), cancel.clone())
                .instrument(tracing::info_span!("stage", stage = ItemStage::Reading.as_str())),
        );

        let fetch_stage = launch_stage(ItemStage::Fetching, workers.fetchers, fetched_tx, |fetched| {
            fetch_worker(
                fetcher.clone(),
                url_rx.clone(),
                fetched,
                error_tx.clone(),
                cancel.clone(),
            )
        });

        let extract_stage = launch_stage(ItemStage::Extracting, workers.parsers, text_tx, |texts| {
            extract_worker(extractor.clone(), fetched_rx.clone(), texts, cancel.clone())
        });

        let count_stage = launch_stage(ItemStage::Counting, workers.counters, count_tx, |counts| {
            count_worker(
                counter.clone(),
                text_rx.clone(),
                counts,
                error_tx.clone(),
                cancel.clone(),
            )
        });

        // Only workers may keep the queues open from here on
        drop((url_rx, fetched_rx, text_rx, error_tx));

        let aggregate = tokio::spawn(
            aggregate_worker(aggregator.clone(), count_rx, cancel.clone())
                .instrument(tracing::info_span!("stage", stage = ItemStage::Aggregated.as_str())),
        );

        let finished = CancellationToken::new();
        let progress = (!settings.progress_interval.is_zero()).then(|| {
            tokio::spawn(report_progress(
                aggregator.clone(),
                settings.progress_interval,
                finished.clone(),
            ))
        });

        match aggregate.await {
            Ok(items) => tracing::info!("Aggregator finished after {} items", items),
            Err(e) => tracing::error!("Aggregator task failed: {}", e),
        }
        finished.cancel();

        for (stage, handle) in [
            (ItemStage::Fetching, fetch_stage),
            (ItemStage::Extracting, extract_stage),
            (ItemStage::Counting, count_stage),
        ] {
            if let Err(e) = handle.await {
                tracing::error!("{} stage closer failed: {}", stage, e);
            }
        }
        if let Err(e) = reader.await {
            tracing::error!("URL reader failed: {}", e);
        }
        if let Some(progress) = progress {
            if let Err(e) = progress.await {
                tracing::error!("Progress reporter failed: {}", e);
            }
        }

        let errors = collector.await.unwrap_or_else(|e| {
            tracing::error!("Error collector failed: {}", e);
            ErrorTally::default()
        });

        let cancelled = cancel.is_cancelled();
        if cancelled {
            tracing::warn!("Pipeline cancelled; results are partial");
        } else {
            tracing::info!("Pipeline complete");
        }

        PipelineOutcome { errors, cancelled }
    }
}

/// Starts a stage's workers and the task that closes the stage's output queue
///
/// Workers get clones of `output`; the returned closer task holds the
/// original. It waits for every worker to exit and then drops the sender, so
/// the queue closes exactly once, after the last worker is gone.
fn launch_stage<T, F, Fut>(
    stage: ItemStage,
    count: usize,
    output: Sender<T>,
    mut spawn_worker: F,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: FnMut(Sender<T>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut workers = JoinSet::new();
    for id in 0..count {
        let span = tracing::info_span!("worker", stage = stage.as_str(), id);
        workers.spawn(spawn_worker(output.clone()).instrument(span));
    }

    tokio::spawn(async move {
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("{} worker failed: {}", stage, e);
            }
        }
        drop(output);
        tracing::debug!("All {} workers finished, output queue closed", stage);
    })
}

/// Logs a snapshot of the totals at a fixed interval until the run finishes
async fn report_progress(aggregator: Arc<Aggregator>, every: Duration, finished: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = finished.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = aggregator.snapshot().await;
                tracing::info!(
                    "Progress: {} articles, {} words, {} unique ({:.1} articles/sec)",
                    snapshot.total_items,
                    snapshot.total_words,
                    snapshot.unique_words,
                    snapshot.items_per_second()
                );
            }
        }
    }
}
