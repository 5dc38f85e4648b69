//! Ripple-Lexicon: a polite single-site word-frequency crawler
//!
//! This crate fetches a bounded list of documents from one site, extracts their
//! editorial text, and builds a global word-frequency report. Fetching respects
//! the site's robots.txt rules and crawl delay, and is throttled by a shared
//! token bucket.
//!
//! The work runs as a staged pipeline (fetch → extract → count → aggregate)
//! connected by bounded queues, with cooperative cancellation and cascading
//! shutdown.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;
pub mod words;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Ripple-Lexicon operations
///
/// Only startup and final-output failures surface through this type. Per-item
/// failures inside the pipeline are counted, not propagated.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to read word bank {}: {source}", path.display())]
    WordBank {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open URL list {}: {source}", path.display())]
    SourceList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("URL error: {0}")]
    Url(#[from] crate::url::UrlError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid content selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Input file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
}

/// Result type alias for Ripple-Lexicon operations
pub type Result<T> = std::result::Result<T, LexiconError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Pipeline, PipelineOutcome, WorkerDistribution};
pub use robots::CrawlPolicy;
pub use state::{Aggregator, ItemStage};
pub use words::{WordBank, WordCounter, WordValidator};
