//! Configuration module for Ripple-Lexicon
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional; command-line flags override file values.
//!
//! # Example
//!
//! ```no_run
//! use ripple_lexicon::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lexicon.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExtractionConfig, InputConfig, OutputConfig, QueueConfig, SiteConfig,
    UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_input_files, MIN_RATE_LIMIT};
