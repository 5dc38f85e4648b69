//! Item stage definitions for tracking pipeline progress
//!
//! Every URL moves through the stages in order; a failure is attributed to
//! the stage where it happened. Pipeline tasks are labelled with the stage
//! they move items into.
use std::fmt;

/// Represents where a single URL is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemStage {
    /// Being read from the URL list
    Reading,

    /// Waiting on the rate gate or the network
    Fetching,

    /// Editorial text is being pulled out of the document
    Extracting,

    /// Text is being tokenized and validated
    Counting,

    /// Counts have been folded into the global totals
    Aggregated,
}

impl ItemStage {
    /// Lowercase name used in spans, log and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Counting => "counting",
            Self::Aggregated => "aggregated",
        }
    }
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
