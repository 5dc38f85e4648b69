//! Report types and the output trait
//!
//! This module defines the final run report and the trait interface for
//! writing it somewhere.

use crate::crawler::{ErrorTally, PipelineOutcome};
use crate::state::{Aggregator, WordCount};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format report: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Final word-frequency report for a run
///
/// Built from the aggregator after the pipeline returns, so on cancellation
/// it covers exactly the items that were aggregated.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub top_words: Vec<WordCount>,
    pub total_words_processed: u64,
    pub total_items_processed: u64,
    pub unique_words: usize,
    pub processing_time_seconds: f64,
    pub errors: ErrorTally,
    pub extraction_failures: u64,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
}

impl Report {
    /// Assembles the report from the run's totals and outcome
    ///
    /// # Arguments
    ///
    /// * `aggregator` - The run's shared totals
    /// * `outcome` - What [`Pipeline::run`](crate::Pipeline::run) returned
    /// * `extraction_failures` - The extractor's failure counter
    /// * `top_n` - Number of top words to include
    pub async fn build(
        aggregator: &Aggregator,
        outcome: &PipelineOutcome,
        extraction_failures: u64,
        top_n: usize,
    ) -> Self {
        let snapshot = aggregator.snapshot().await;
        Self {
            top_words: aggregator.top_words(top_n).await,
            total_words_processed: snapshot.total_words,
            total_items_processed: snapshot.total_items,
            unique_words: snapshot.unique_words,
            processing_time_seconds: snapshot.elapsed.as_secs_f64(),
            errors: outcome.errors,
            extraction_failures,
            cancelled: outcome.cancelled,
            started_at: aggregator.started_at(),
        }
    }
}

/// Trait for report destinations
pub trait ReportSink {
    /// Writes the final report
    ///
    /// # Arguments
    ///
    /// * `report` - The report to write
    fn write_report(&self, report: &Report) -> OutputResult<()>;
}
