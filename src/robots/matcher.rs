//! Disallow pattern matching
//!
//! A disallow value is either a literal path prefix or a wildcard pattern in
//! which `*` stands for any run of characters. Wildcard patterns are anchored
//! at the start of the path only.

/// A compiled disallow rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches any path starting with the given prefix
    Prefix(String),

    /// Literal segments separated by `*` in the original pattern
    Wildcard(Vec<String>),
}

impl PathPattern {
    /// Compiles a raw disallow value
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_lexicon::robots::PathPattern;
    ///
    /// let pattern = PathPattern::new("/tag/*/feed");
    /// assert!(pattern.matches("/tag/science/feed"));
    /// assert!(!pattern.matches("/tags/science/feed"));
    /// ```
    pub fn new(raw: &str) -> Self {
        if raw.contains('*') {
            Self::Wildcard(raw.split('*').map(str::to_string).collect())
        } else {
            Self::Prefix(raw.to_string())
        }
    }

    /// Checks if a URL path is covered by this pattern
    ///
    /// An empty pattern matches nothing; a bare `*` matches everything.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => !prefix.is_empty() && path.starts_with(prefix.as_str()),
            Self::Wildcard(segments) => matches_segments(path, segments),
        }
    }
}

/// Greedy left-to-right scan equivalent to `^seg0.*seg1.*seg2...`
fn matches_segments(path: &str, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    let Some(mut remaining) = path.strip_prefix(first.as_str()) else {
        return false;
    };

    for segment in rest {
        // Trailing (or doubled) stars produce empty segments that match anywhere
        if segment.is_empty() {
            continue;
        }
        match remaining.find(segment.as_str()) {
            Some(idx) => remaining = &remaining[idx + segment.len()..],
            None => return false,
        }
    }

    true
}

/// Checks if a path matches a raw robots.txt disallow pattern
///
/// # Arguments
///
/// * `path` - The URL path (e.g. "/tag/expire-images123")
/// * `pattern` - The disallow value, optionally containing `*`
///
/// # Returns
///
/// * `true` - If the path is covered by the pattern
/// * `false` - Otherwise, and always for an empty pattern
///
/// # Examples
///
/// ```
/// use ripple_lexicon::robots::matches_pattern;
///
/// assert!(matches_pattern("/tag/expire-images123", "/tag/expire-images*"));
/// assert!(!matches_pattern("/tag/other", "/tag/expire-images*"));
/// assert!(matches_pattern("/admin/users", "/admin"));
/// ```
pub fn matches_pattern(path: &str, pattern: &str) -> bool {
    PathPattern::new(pattern).matches(path)
}
