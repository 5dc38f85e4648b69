//! URL handling module for Ripple-Lexicon
//!
//! This module provides the small set of URL helpers the crawler needs:
//! deriving the target site's origin, locating its robots.txt, and checking
//! that listed URLs belong to that site.

mod domain;

pub use domain::{extract_domain, is_same_site};

use thiserror::Error;
use url::Url;

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL '{url}': {source}")]
    Parse {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL: {0}")]
    MissingDomain(String),
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Reduces a URL to its origin (`scheme://host[:port]/`)
///
/// # Arguments
///
/// * `raw` - Any absolute http(s) URL on the site
///
/// # Returns
///
/// * `Ok(Url)` - The origin with path `/`
/// * `Err(UrlError)` - If the URL is malformed, not http(s), or has no host
///
/// # Examples
///
/// ```
/// use ripple_lexicon::url::site_origin;
///
/// let origin = site_origin("https://www.example.com/2024/01/some-article?x=1").unwrap();
/// assert_eq!(origin.as_str(), "https://www.example.com/");
/// ```
pub fn site_origin(raw: &str) -> UrlResult<Url> {
    let mut url = Url::parse(raw).map_err(|source| UrlError::Parse {
        url: raw.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain(raw.to_string()));
    }

    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Builds the robots.txt location for a site
///
/// # Examples
///
/// ```
/// use ripple_lexicon::url::policy_url;
/// use url::Url;
///
/// let base = Url::parse("http://127.0.0.1:8080/some/page").unwrap();
/// assert_eq!(policy_url(&base).as_str(), "http://127.0.0.1:8080/robots.txt");
/// ```
pub fn policy_url(base: &Url) -> Url {
    let mut url = base.clone();
    url.set_path("/robots.txt");
    url.set_query(None);
    url.set_fragment(None);
    url
}
