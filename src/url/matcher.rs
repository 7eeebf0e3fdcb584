/// Checks if a network location matches an allowed-domain pattern
///
/// Two kinds of patterns are supported:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches "example.com" itself and any
///    subdomain such as "blog.example.com" or "api.v2.example.com"
///
/// Patterns may carry a port ("127.0.0.1:8080"); the port then has to match
/// as part of the string.
///
/// # Examples
///
/// ```
/// use gleaner::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "blog.example.com"));
/// assert!(matches_wildcard("*.example.com", "blog.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Returns true if the link or its path contains any exclusion pattern
///
/// Matching is plain, case-sensitive substring containment.
pub fn is_excluded(link: &str, path: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| link.contains(pattern.as_str()) || path.contains(pattern.as_str()))
}
