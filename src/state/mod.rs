//! State module for tracking crawl progress
//!
//! This module holds the run-wide shared state of the pipeline.
//!
//! # Components
//!
//! - `ItemStage`: Where an individual URL is in the pipeline
//! - `Aggregator`: Global word frequencies and run totals behind one async lock

mod counters;
mod item_stage;

// Re-export main types
pub use counters::{rank_top_words, Aggregator, CountersSnapshot, WordCount};
pub use item_stage::ItemStage;
