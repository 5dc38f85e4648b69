use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase domain/host
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_lexicon::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a raw URL lives on the same host and port as the site
///
/// The crawl policy only covers its own origin, so URLs elsewhere are
/// worth a warning. Unparseable URLs are never on the site.
pub fn is_same_site(site: &Url, raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            extract_domain(&url) == extract_domain(site)
                && url.port_or_known_default() == site.port_or_known_default()
        }
        Err(_) => false,
    }
}
