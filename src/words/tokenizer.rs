use super::WordValidator;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximal runs of ASCII letters; everything else separates tokens
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+").expect("Token regex is hardcoded and valid"));

/// Splits text into words and counts the valid ones
#[derive(Clone)]
pub struct WordCounter {
    validator: Arc<dyn WordValidator>,
}

impl WordCounter {
    pub fn new(validator: Arc<dyn WordValidator>) -> Self {
        Self { validator }
    }

    /// Counts validated, lowercased tokens in `text`
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_lexicon::words::{WordBank, WordCounter};
    /// use std::sync::Arc;
    ///
    /// let counter = WordCounter::new(Arc::new(WordBank::from_words(["rust"])));
    /// let counts = counter.count("Rust, rust... and RUST!");
    /// assert_eq!(counts["rust"], 3);
    /// ```
    pub fn count(&self, text: &str) -> HashMap<String, u64> {
        let mut counts = HashMap::new();
        for token in TOKEN_PATTERN.find_iter(text) {
            let word = token.as_str().to_lowercase();
            if self.validator.is_valid(&word) {
                *counts.entry(word).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl std::fmt::Debug for WordCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordCounter").finish_non_exhaustive()
    }
}
