//! Robots.txt handling module
//!
//! This module provides functionality for fetching and parsing the target
//! site's robots.txt, and answering permission and crawl-delay queries.
//! The document is fetched once at startup; the parsed [`CrawlPolicy`] is
//! immutable afterwards.

mod matcher;
mod parser;

pub use matcher::{matches_pattern, PathPattern};
pub use parser::{CrawlPolicy, RuleGroup};

use crate::url::policy_url;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Robots.txt errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Invalid base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: ::url::ParseError,
    },
}

/// Fetches and parses robots.txt for the target site
///
/// Loading never aborts the run:
/// - 404 means there is no policy, so everything is allowed
/// - other error statuses, transport failures, undecodable bodies and
///   cancellation degrade to allow-all with a warning
///
/// # Arguments
///
/// * `client` - The HTTP client (already carrying the crawler's User-Agent)
/// * `base_url` - Any URL on the target site; only its origin is used
/// * `cancel` - Shutdown signal
///
/// # Returns
///
/// The parsed policy, or an allow-all policy
pub async fn load_policy(client: &Client, base_url: &Url, cancel: &CancellationToken) -> CrawlPolicy {
    let robots_url = policy_url(base_url);
    tracing::info!("Fetching robots.txt from: {}", robots_url);

    let fetched = tokio::select! {
        _ = cancel.cancelled() => {
            tracing::warn!("Cancelled while loading robots.txt, continuing without it");
            return CrawlPolicy::allow_all(base_url.clone());
        }
        fetched = fetch_policy_document(client, &robots_url) => fetched,
    };

    let content = match fetched {
        Ok(Some(content)) => content,
        Ok(None) => {
            tracing::info!("No robots.txt found - all URLs allowed");
            return CrawlPolicy::allow_all(base_url.clone());
        }
        Err(reason) => {
            tracing::warn!(
                "Failed to load robots.txt ({}), treating all URLs as allowed",
                reason
            );
            return CrawlPolicy::allow_all(base_url.clone());
        }
    };

    match CrawlPolicy::parse(&content, base_url.as_str()) {
        Ok(policy) => {
            tracing::info!("Loaded robots.txt with {} rule groups", policy.groups().len());
            policy
        }
        Err(e) => {
            tracing::warn!("Failed to parse robots.txt: {}", e);
            CrawlPolicy::allow_all(base_url.clone())
        }
    }
}

/// Retrieves the raw robots.txt body
///
/// Returns `Ok(None)` when the server reports the document as absent.
async fn fetch_policy_document(client: &Client, robots_url: &Url) -> Result<Option<String>, String> {
    let response = client
        .get(robots_url.clone())
        .send()
        .await
        .map_err(|e| format!("request failed: {}", e))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(format!("HTTP {}", status.as_u16()));
    }

    response
        .text()
        .await
        .map(Some)
        .map_err(|e| format!("unreadable body: {}", e))
}
