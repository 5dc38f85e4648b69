use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Ripple-Lexicon
///
/// Every section is optional in the TOML file; missing sections and keys fall
/// back to the defaults below. Command-line flags are applied on top.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub site: SiteConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    pub extraction: ExtractionConfig,
    pub queues: QueueConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Total number of pipeline workers, split across the stages
    pub workers: usize,

    /// Requests per second (0 = derive from robots.txt crawl-delay, else unlimited)
    #[serde(rename = "rate-limit")]
    pub rate_limit: f64,

    /// Token bucket burst capacity (defaults to floor(rate-limit) + 1)
    pub burst: Option<u32>,

    /// Network attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First retry delay in milliseconds; doubled per attempt
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Ceiling for the retry delay in milliseconds
    #[serde(rename = "backoff-max-ms")]
    pub backoff_max_ms: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Seconds between progress log lines (0 disables)
    #[serde(rename = "progress-interval-secs")]
    pub progress_interval_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 50,
            rate_limit: 0.0,
            burst: None,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
            request_timeout_secs: 30,
            progress_interval_secs: 10,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// Optional URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RippleLexicon".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Target site configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL of the single target site; robots.txt is loaded from its origin.
    /// When unset, the origin of the first URL in the list is used.
    #[serde(rename = "base-url")]
    pub base_url: Option<String>,
}

/// Input file configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// File with one URL per line (`#` comments and blank lines skipped)
    #[serde(rename = "urls-file")]
    pub urls_file: Option<PathBuf>,

    /// File with one valid word per line
    #[serde(rename = "wordbank-file")]
    pub wordbank_file: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of top words to include in the report
    #[serde(rename = "top-words")]
    pub top_words: usize,

    /// Path of the JSON report (stdout when unset)
    #[serde(rename = "report-path")]
    pub report_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            top_words: 10,
            report_path: None,
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// CSS selectors tried in order; the first one yielding text wins
    pub selectors: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            selectors: vec![
                "article header, [data-article-body='true']".to_string(),
                "[data-article-body='true']".to_string(),
            ],
        }
    }
}

/// Bounded queue capacities between pipeline stages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub urls: usize,
    pub fetched: usize,
    pub texts: usize,
    pub counts: usize,
    pub errors: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            urls: 100,
            fetched: 50,
            texts: 50,
            counts: 100,
            errors: 100,
        }
    }
}
