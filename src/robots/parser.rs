//! Robots.txt parser implementation
//!
//! The parser is deliberately small: it understands `User-agent`, `Disallow`
//! and `Crawl-delay` and ignores everything else.

use crate::robots::matcher::PathPattern;
use crate::robots::PolicyError;
use std::time::Duration;
use url::Url;

/// Rules attached to one `User-agent` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    /// Agent name as written in the file (`*` for the wildcard group)
    pub agent: String,

    /// Disallow patterns in file order
    pub disallow: Vec<PathPattern>,

    /// Crawl delay for this group (zero when unspecified)
    pub crawl_delay: Duration,
}

impl RuleGroup {
    fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            disallow: Vec::new(),
            crawl_delay: Duration::ZERO,
        }
    }

    fn is_wildcard(&self) -> bool {
        self.agent == "*"
    }

    fn is_for(&self, agent: &str) -> bool {
        self.agent.eq_ignore_ascii_case(agent)
    }

    fn disallows(&self, path: &str) -> bool {
        self.disallow.iter().any(|pattern| pattern.matches(path))
    }
}

/// Parsed robots.txt for the target site
///
/// Immutable once built; share it behind an `Arc` without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlPolicy {
    groups: Vec<RuleGroup>,
    base_url: Url,
}

impl CrawlPolicy {
    /// Parses robots.txt content into rule groups
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    /// * `base_url` - The site the document belongs to
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlPolicy)` - Parsed policy; unknown lines are skipped, never fatal
    /// * `Err(PolicyError)` - `base_url` is not an absolute URL
    ///
    /// # Example
    ///
    /// ```
    /// use ripple_lexicon::robots::CrawlPolicy;
    ///
    /// let policy = CrawlPolicy::parse(
    ///     "User-agent: *\nDisallow: /private",
    ///     "https://example.com",
    /// ).unwrap();
    /// assert!(!policy.is_allowed("https://example.com/private/a", "AnyBot"));
    /// assert!(policy.is_allowed("https://example.com/public", "AnyBot"));
    /// ```
    pub fn parse(content: &str, base_url: &str) -> Result<Self, PolicyError> {
        let base_url = Url::parse(base_url).map_err(|source| PolicyError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        let mut groups = Vec::new();
        let mut current: Option<RuleGroup> = None;

        for line in content.lines() {
            let trimmed = line.trim();

            // Skip comments and empty lines
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // Each declaration starts a new group
                    if let Some(group) = current.take() {
                        groups.push(group);
                    }
                    current = Some(RuleGroup::new(value));
                }
                "disallow" => {
                    if let Some(group) = current.as_mut() {
                        if !value.is_empty() {
                            group.disallow.push(PathPattern::new(value));
                        }
                    }
                }
                "crawl-delay" => {
                    if let Some(group) = current.as_mut() {
                        // Whole seconds only; anything else is ignored
                        if let Ok(seconds) = value.parse::<u64>() {
                            group.crawl_delay = Duration::from_secs(seconds);
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(group) = current.take() {
            groups.push(group);
        }

        Ok(Self { groups, base_url })
    }

    /// Creates a permissive policy with no rule groups
    ///
    /// This is used when robots.txt is absent or cannot be fetched.
    pub fn allow_all(base_url: Url) -> Self {
        Self {
            groups: Vec::new(),
            base_url,
        }
    }

    /// Returns the rule groups in file order
    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    /// Returns the site this policy was loaded for
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Checks if a URL is allowed for the given agent
    ///
    /// Groups naming the agent (case-insensitive) are consulted first, then
    /// every `*` group. The first group with a matching disallow pattern
    /// denies the URL. Malformed URLs are denied.
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `agent` - The crawler's agent token
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed or cannot be parsed
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.groups.is_empty() {
            return true;
        }

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        let path = match parsed.path() {
            "" => "/",
            path => path,
        };

        let specific = self.groups.iter().filter(|g| g.is_for(agent));
        let wildcard = self.groups.iter().filter(|g| g.is_wildcard());

        !specific.chain(wildcard).any(|group| group.disallows(path))
    }

    /// Gets the crawl delay for a specific agent
    ///
    /// Prefers the first agent-specific group with a nonzero delay, then the
    /// first wildcard group with a nonzero delay.
    ///
    /// # Returns
    ///
    /// The delay, or `Duration::ZERO` if none is specified
    pub fn crawl_delay(&self, agent: &str) -> Duration {
        let specific = self
            .groups
            .iter()
            .find(|g| g.is_for(agent) && !g.crawl_delay.is_zero());
        let wildcard = || {
            self.groups
                .iter()
                .find(|g| g.is_wildcard() && !g.crawl_delay.is_zero())
        };

        specific
            .or_else(wildcard)
            .map(|g| g.crawl_delay)
            .unwrap_or(Duration::ZERO)
    }
}
