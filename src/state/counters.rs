//! Global word-frequency counters
//!
//! A single aggregator owns the run totals. Mutations take the write lock;
//! readers get an owned snapshot under the read lock.

use crate::crawler::WordCounts;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Progress is logged every this many aggregated items
const PROGRESS_EVERY: u64 = 100;

/// A word and its frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

#[derive(Debug, Default)]
struct Counters {
    words: HashMap<String, u64>,
    total_words: u64,
    total_items: u64,
}

/// Point-in-time copy of the run totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountersSnapshot {
    pub total_items: u64,
    pub total_words: u64,
    pub unique_words: usize,
    pub elapsed: Duration,
}

impl CountersSnapshot {
    /// Items aggregated per second since the run started
    pub fn items_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_items as f64 / secs
        } else {
            0.0
        }
    }
}

/// Collects per-document word counts into global totals
#[derive(Debug)]
pub struct Aggregator {
    counters: RwLock<Counters>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Creates an empty aggregator; the run clock starts now
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(Counters::default()),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Folds one document's counts into the totals
    ///
    /// Adds one processed item and the document's word total.
    pub async fn add(&self, item: WordCounts) {
        let mut counters = self.counters.write().await;

        let mut item_words = 0;
        for (word, count) in item.counts {
            *counters.words.entry(word).or_insert(0) += count;
            item_words += count;
        }
        counters.total_words += item_words;
        counters.total_items += 1;

        if counters.total_items % PROGRESS_EVERY == 0 {
            let elapsed = self.started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                counters.total_items as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                "Processed {} articles, {} words ({:.1} articles/sec)",
                counters.total_items,
                counters.total_words,
                rate
            );
        }
    }

    /// Returns the current totals
    pub async fn snapshot(&self) -> CountersSnapshot {
        let counters = self.counters.read().await;
        CountersSnapshot {
            total_items: counters.total_items,
            total_words: counters.total_words,
            unique_words: counters.words.len(),
            elapsed: self.started.elapsed(),
        }
    }

    /// Returns the `n` most frequent words
    pub async fn top_words(&self, n: usize) -> Vec<WordCount> {
        let counters = self.counters.read().await;
        rank_top_words(&counters.words, n)
    }

    /// Wall-clock time the run started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Ranks words by count descending, ties broken by word ascending
///
/// # Arguments
///
/// * `words` - Word frequencies
/// * `n` - Maximum number of entries to return
///
/// # Example
///
/// ```
/// use ripple_lexicon::state::rank_top_words;
/// use std::collections::HashMap;
///
/// let words = HashMap::from([("apple".to_string(), 2), ("pear".to_string(), 5)]);
/// let top = rank_top_words(&words, 1);
/// assert_eq!(top[0].word, "pear");
/// ```
pub fn rank_top_words(words: &HashMap<String, u64>, n: usize) -> Vec<WordCount> {
    let mut ranked: Vec<WordCount> = words
        .iter()
        .map(|(word, &count)| WordCount {
            word: word.clone(),
            count,
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(n);
    ranked
}
