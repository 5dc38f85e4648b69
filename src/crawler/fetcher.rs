//! HTTP fetcher implementation
//!
//! This module handles all document requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent string
//! - Robots.txt permission checks before any network traffic
//! - Rate gate acquisition before every attempt
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::UserAgentConfig;
use crate::crawler::retry_backoff::RetryBackoff;
use crate::crawler::rate_gate::{GateError, RateGate};
use crate::robots::CrawlPolicy;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use url::Url;

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

/// Errors from fetching a single document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("URL disallowed by robots.txt: {url}")]
    PolicyDenied { url: String },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("HTTP request failed for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP {status} (server error) from {url}")]
    ServerStatus { url: String, status: u16 },

    #[error("HTTP {status} (client error) from {url}")]
    ClientStatus { url: String, status: u16 },

    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Returns true for failures worth another attempt (transport errors, 5xx)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::ServerStatus { .. })
    }

    /// Returns true if the fetch was abandoned because of shutdown
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns true if robots.txt refused the URL
    pub fn is_policy_denied(&self) -> bool {
        matches!(self, Self::PolicyDenied { .. })
    }
}

impl From<GateError> for FetchError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Cancelled => Self::Cancelled,
        }
    }
}

/// How many times to try a URL and how long to wait between tries
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: RetryBackoff,
}

impl RetryPolicy {
    /// Creates a retry policy; at least one attempt is always made
    pub fn new(max_attempts: u32, backoff: RetryBackoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, RetryBackoff::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use ripple_lexicon::config::UserAgentConfig;
/// use ripple_lexicon::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(100)
        .pool_idle_timeout(Duration::from_secs(90))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves documents under the crawl policy and the shared rate gate
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: Arc<CrawlPolicy>,
    gate: Arc<RateGate>,
    agent: String,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Creates a new fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client (see [`build_http_client`])
    /// * `policy` - The site's parsed robots.txt
    /// * `gate` - The rate gate, already configured for the run
    /// * `agent` - Agent token matched against robots.txt groups
    /// * `retry` - Attempt bound and backoff
    pub fn new(
        client: Client,
        policy: Arc<CrawlPolicy>,
        gate: Arc<RateGate>,
        agent: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            policy,
            gate,
            agent: agent.into(),
            retry,
        }
    }

    /// Checks if robots.txt allows our agent to fetch a URL
    pub fn is_allowed(&self, url: &str) -> bool {
        self.policy.is_allowed(url, &self.agent)
    }

    /// Returns the shared rate gate
    pub fn gate(&self) -> &RateGate {
        &self.gate
    }

    /// Returns the crawl policy in use
    pub fn policy(&self) -> &CrawlPolicy {
        &self.policy
    }

    /// Fetches a URL with robots.txt compliance, rate limiting and retries
    ///
    /// # Request Flow
    ///
    /// 1. Check robots.txt; a denied URL never reaches the network or the gate
    /// 2. For each attempt: wait for a rate gate token, then send a GET
    /// 3. Classify the outcome
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 4xx | Fail immediately |
    /// | 5xx | Back off, retry |
    /// | Transport error / timeout | Back off, retry |
    /// | Other status | Fail immediately |
    ///
    /// Every attempt costs one gate token. Cancellation is observed while
    /// waiting for a token, during the request, and during backoff.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to fetch
    /// * `cancel` - Shutdown signal
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body
    /// * `Err(FetchError)` - Denied, cancelled, permanent failure, or retries exhausted
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        if !self.is_allowed(url) {
            return Err(FetchError::PolicyDenied {
                url: url.to_string(),
            });
        }

        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let max_attempts = self.retry.max_attempts;
        let mut delays = self.retry.backoff.schedule();
        let mut attempt = 0;

        loop {
            self.gate.acquire(cancel).await?;

            if attempt > 0 {
                tracing::debug!("Retrying {} (attempt {}/{})", url, attempt + 1, max_attempts);
            }

            let error = match self.attempt(&parsed, cancel).await {
                Ok(body) => return Ok(body),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            attempt += 1;
            if attempt >= max_attempts {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = delays.next_delay();
            tracing::debug!("{}; backing off for {:?}", error, delay);

            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = sleep(delay) => {}
            }
        }
    }

    /// Performs one network attempt
    async fn attempt(&self, url: &Url, cancel: &CancellationToken) -> Result<String, FetchError> {
        let request = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_VALUE)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE);

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = request.send() => response.map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?,
        };

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchError::ServerStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if status.is_client_error() {
            return Err(FetchError::ClientStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = response.text() => body.map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?,
        };

        tracing::debug!("Fetched {} ({}, {} bytes)", url, content_type, body.len());
        Ok(body)
    }
}
