//! URL handling module for Gleaner
//!
//! This module provides network-location extraction, allowed-domain matching
//! and the link filter the site crawler applies to discovered links.

mod domain;
mod matcher;

use url::Url;

// Re-export main functions
pub use domain::{netloc, netloc_of};
pub use matcher::{is_excluded, matches_wildcard};

/// Decides which discovered links a crawl may follow
///
/// A link is followable when its network location equals the seed's, or
/// matches one of the allowed domains, and neither the link nor its path
/// contains an exclusion pattern.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    seed_netloc: Option<String>,
    allowed_domains: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl LinkFilter {
    /// Creates a link filter for a crawl starting at `seed_url`
    ///
    /// # Arguments
    ///
    /// * `seed_url` - The crawl's starting URL
    /// * `allowed_domains` - Allowed network locations; empty means only the seed's
    /// * `exclude_patterns` - Substrings that rule a link out
    pub fn new(seed_url: &str, allowed_domains: &[String], exclude_patterns: &[String]) -> Self {
        let seed_netloc = netloc_of(seed_url);

        let allowed_domains = if allowed_domains.is_empty() {
            seed_netloc.iter().cloned().collect()
        } else {
            allowed_domains.to_vec()
        };

        Self {
            seed_netloc,
            allowed_domains,
            exclude_patterns: exclude_patterns.to_vec(),
        }
    }

    /// Returns the allowed domains in effect (after defaulting)
    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    /// Returns true if the crawl may follow `link`
    pub fn allows(&self, link: &str) -> bool {
        let parsed = match Url::parse(link) {
            Ok(url) => url,
            Err(_) => return false,
        };

        let link_netloc = match netloc(&parsed) {
            Some(n) => n,
            None => return false,
        };

        let is_internal = self.seed_netloc.as_deref() == Some(link_netloc.as_str())
            || self
                .allowed_domains
                .iter()
                .any(|pattern| matches_wildcard(pattern, &link_netloc));

        is_internal && !is_excluded(link, parsed.path(), &self.exclude_patterns)
    }
}
