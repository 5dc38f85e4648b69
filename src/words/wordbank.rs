use crate::{LexiconError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

/// Entries must be purely alphabetic and at least three letters long
static ENTRY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{3,}$").expect("Word bank regex is hardcoded and valid"));

/// Decides whether a token is a real word
pub trait WordValidator: Send + Sync {
    fn is_valid(&self, word: &str) -> bool;
}

/// Dictionary of accepted words, stored lowercase
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    words: HashSet<String>,
}

impl WordBank {
    /// Loads a newline-separated word list
    ///
    /// Entries are trimmed and lowercased; anything that is not at least
    /// three ASCII letters is dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(WordBank)` - The loaded dictionary
    /// * `Err(LexiconError::WordBank)` - The file is missing or unreadable
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LexiconError::WordBank {
                path: path.to_path_buf(),
                source,
            })?;

        let bank = Self::from_words(content.lines());
        tracing::info!("Loaded {} words from {}", bank.len(), path.display());
        Ok(bank)
    }

    /// Builds a word bank from in-memory entries, applying the same filter as [`WordBank::load`]
    pub fn from_words<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_lowercase())
            .filter(|entry| ENTRY_PATTERN.is_match(entry))
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl WordValidator for WordBank {
    fn is_valid(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        if self.words.contains(word) {
            return true;
        }
        self.words.contains(&word.to_lowercase())
    }
}
