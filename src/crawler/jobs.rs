//! Envelopes passed between pipeline stages
//!
//! Each envelope travels through exactly one queue, produced by one stage
//! instance and consumed by one stage instance.

use crate::crawler::extractor::ExtractionError;
use crate::crawler::fetcher::FetchError;
use crate::state::ItemStage;
use std::collections::HashMap;
use thiserror::Error;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlJob {
    pub url: String,
}

/// Outcome of fetching one URL
#[derive(Debug)]
pub struct FetchResult {
    pub url: String,
    pub body: Result<String, FetchError>,
}

/// Outcome of extracting editorial text from one document
#[derive(Debug)]
pub struct TextResult {
    pub url: String,
    pub text: Result<String, ItemFailure>,
}

/// Validated word counts for one document
#[derive(Debug, Clone, Default)]
pub struct WordCounts {
    pub url: String,
    pub counts: HashMap<String, u64>,
}

impl WordCounts {
    /// Total number of counted words in this document
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// Why a single item did not make it to aggregation
#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("URL source failed: {0}")]
    Source(String),
}

/// A per-item failure routed to the error collector
#[derive(Debug, Error)]
#[error("[{stage}] {url}: {failure}")]
pub struct ItemError {
    pub url: String,
    pub stage: ItemStage,
    #[source]
    pub failure: ItemFailure,
}

impl ItemError {
    pub fn new(url: impl Into<String>, stage: ItemStage, failure: impl Into<ItemFailure>) -> Self {
        Self {
            url: url.into(),
            stage,
            failure: failure.into(),
        }
    }
}

/// Per-class counts of item failures, owned by the error collector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ErrorTally {
    pub policy_denied: u64,
    pub fetch: u64,
    pub extraction: u64,
    pub source: u64,
}

impl ErrorTally {
    /// Counts one failure under its class
    pub fn record(&mut self, failure: &ItemFailure) {
        match failure {
            ItemFailure::Fetch(e) if e.is_policy_denied() => self.policy_denied += 1,
            ItemFailure::Fetch(_) => self.fetch += 1,
            ItemFailure::Extraction(_) => self.extraction += 1,
            ItemFailure::Source(_) => self.source += 1,
        }
    }

    /// Sum over all classes
    pub fn total(&self) -> u64 {
        self.policy_denied + self.fetch + self.extraction + self.source
    }
}
