//! Editorial text extraction
//!
//! Pulls the article text out of a fetched HTML document using an ordered
//! list of CSS selectors. Navigation, ads and other page chrome are left
//! behind because only the selected elements contribute text.

use crate::{ConfigError, ConfigResult};
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Extraction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no content selector produced text")]
    NoContent,
}

/// Turns a raw document into plain text
pub trait ContentExtractor: Send + Sync {
    /// Extracts the editorial text of a document
    fn extract(&self, body: &str) -> Result<String, ExtractionError>;

    /// Number of documents for which extraction failed so far
    fn failure_count(&self) -> u64;
}

/// Selector-driven extractor
///
/// Selectors are tried in order; the first whose matched elements contain
/// non-whitespace text wins.
#[derive(Debug)]
pub struct SelectorExtractor {
    selectors: Vec<(String, Selector)>,
    failures: AtomicU64,
}

impl SelectorExtractor {
    /// Compiles the given CSS selectors
    ///
    /// # Arguments
    ///
    /// * `selectors` - CSS selectors in priority order
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorExtractor)` - All selectors compiled
    /// * `Err(ConfigError)` - A selector is invalid, or none were given
    pub fn new(selectors: &[String]) -> ConfigResult<Self> {
        if selectors.is_empty() {
            return Err(ConfigError::Validation(
                "At least one content selector is required".to_string(),
            ));
        }

        let compiled = selectors
            .iter()
            .map(|raw| {
                Selector::parse(raw)
                    .map(|selector| (raw.clone(), selector))
                    .map_err(|e| ConfigError::InvalidSelector {
                        selector: raw.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            selectors: compiled,
            failures: AtomicU64::new(0),
        })
    }

    fn select_text(document: &Html, selector: &Selector) -> String {
        let parts: Vec<String> = document
            .select(selector)
            .map(|element| element.text().collect::<String>())
            .collect();
        parts.join(" ").trim().to_string()
    }
}

impl ContentExtractor for SelectorExtractor {
    fn extract(&self, body: &str) -> Result<String, ExtractionError> {
        let document = Html::parse_document(body);

        for (raw, selector) in &self.selectors {
            let text = Self::select_text(&document, selector);
            if !text.is_empty() {
                tracing::trace!("Extracted {} chars using selector '{}'", text.len(), raw);
                return Ok(text);
            }
        }

        self.failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("No content selector matched");
        Err(ExtractionError::NoContent)
    }

    fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
