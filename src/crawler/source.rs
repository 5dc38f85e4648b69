//! URL list input
//!
//! The crawl works through a fixed list of URLs, one per line. Blank lines and
//! lines starting with `#` are skipped.

use crate::url::site_origin;
use crate::{LexiconError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use url::Url;

enum SourceLines {
    File(Lines<BufReader<File>>),
    Memory(std::vec::IntoIter<String>),
}

/// Sequential reader over the URL list
pub struct UrlSource {
    origin: Option<PathBuf>,
    lines: SourceLines,
}

impl UrlSource {
    /// Opens a URL list file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a newline-separated URL list
    ///
    /// # Returns
    ///
    /// * `Ok(UrlSource)` - The file is open for reading
    /// * `Err(LexiconError::SourceList)` - The file could not be opened
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).await.map_err(|source| LexiconError::SourceList {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            origin: Some(path.to_path_buf()),
            lines: SourceLines::File(BufReader::new(file).lines()),
        })
    }

    /// Creates a source over an in-memory list
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        Self {
            origin: None,
            lines: SourceLines::Memory(urls.into_iter()),
        }
    }

    /// Describes where the URLs come from, for log and error messages
    pub fn describe(&self) -> String {
        match &self.origin {
            Some(path) => path.display().to_string(),
            None => "<memory>".to_string(),
        }
    }

    /// Returns the next URL, skipping blank lines and comments
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` - The next trimmed URL
    /// * `Ok(None)` - The list is exhausted
    /// * `Err(io::Error)` - Reading failed (e.g. the file is not valid UTF-8)
    pub async fn next_url(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let line = match &mut self.lines {
                SourceLines::File(lines) => lines.next_line().await?,
                SourceLines::Memory(urls) => urls.next(),
            };

            let Some(line) = line else {
                return Ok(None);
            };

            let url = line.trim();
            if url.is_empty() || url.starts_with('#') {
                continue;
            }
            return Ok(Some(url.to_string()));
        }
    }
}

/// Target site found by scanning a URL list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDiscovery {
    /// Origin of the first usable URL, if any
    pub site: Option<Url>,
    /// Entries before it that are not absolute http(s) URLs
    pub skipped: u64,
}

/// Derives the target site from the first usable URL of a list file
///
/// Used when no base URL is configured. Entries that do not yield an
/// http(s) origin are skipped here; the pipeline later reports them as
/// per-item failures.
///
/// # Returns
///
/// * `Ok(SiteDiscovery)` - `site` is `None` if no entry is usable
/// * `Err(LexiconError::SourceList)` - The file could not be opened or read
pub async fn discover_site(path: &Path) -> Result<SiteDiscovery> {
    let mut source = UrlSource::open(path).await?;
    let mut skipped = 0;

    loop {
        let next = source.next_url().await.map_err(|source| LexiconError::SourceList {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(url) = next else {
            return Ok(SiteDiscovery { site: None, skipped });
        };

        match site_origin(&url) {
            Ok(site) => {
                return Ok(SiteDiscovery {
                    site: Some(site),
                    skipped,
                })
            }
            Err(e) => {
                tracing::debug!("Not deriving the site from {}: {}", url, e);
                skipped += 1;
            }
        }
    }
}
