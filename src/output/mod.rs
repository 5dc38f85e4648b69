//! Output module for the final run report
//!
//! This module handles:
//! - Assembling the word-frequency report from the aggregator
//! - Writing it as JSON to stdout or a file
//! - Printing human-readable statistics

mod json;
pub mod stats;
mod traits;

pub use crate::state::WordCount;
pub use json::JsonReportWriter;
pub use stats::{print_statistics, render_statistics};
pub use traits::{OutputError, OutputResult, Report, ReportSink};
