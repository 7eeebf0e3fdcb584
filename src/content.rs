//! Scraped content records and scrape options

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A metadata value: a single string or a list of strings (e.g. keywords)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Text(String),
    List(Vec<String>),
}

impl MetaValue {
    /// Returns the value as a string slice if it is a single string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// Returns the value as a list if it is a list
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(items) => Some(items),
        }
    }
}

/// Page metadata keyed by name (`description`, `keywords`, `author`, `date`, `language`)
pub type Metadata = BTreeMap<String, MetaValue>;

/// The record produced for one successfully scraped page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedContent {
    /// The URL that was requested
    pub url: String,

    /// Best-effort page title
    pub title: String,

    /// Visible text, whitespace-collapsed
    pub content: String,

    pub metadata: Metadata,

    /// Capture time (RFC 3339)
    pub timestamp: String,

    /// HTTP status code of the response
    pub status: u16,

    /// Number of whitespace-separated tokens in `content`
    pub word_count: usize,

    /// Absolute URLs from `<a href>`, without duplicates
    pub links: Vec<String>,

    /// Absolute URLs from `<img src>`, without duplicates
    pub images: Vec<String>,
}

impl ScrapedContent {
    /// Builds a record captured now, deriving the word count from `content`
    pub fn new(
        url: impl Into<String>,
        status: u16,
        title: String,
        content: String,
        metadata: Metadata,
        links: Vec<String>,
        images: Vec<String>,
    ) -> Self {
        let word_count = count_words(&content);
        Self {
            url: url.into(),
            title,
            content,
            metadata,
            timestamp: chrono::Utc::now().to_rfc3339(),
            status,
            word_count,
            links,
            images,
        }
    }

    /// Re-derives `word_count` from `content`
    ///
    /// Records read back from disk go through this so a stale or hand-edited
    /// count never survives a round trip.
    pub fn with_recomputed_word_count(mut self) -> Self {
        self.word_count = count_words(&self.content);
        self
    }

    /// Returns a metadata entry as text, if present and a single string
    pub fn meta_text(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetaValue::as_text)
    }
}

/// Counts whitespace-separated tokens
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Options controlling how a single page is scraped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Extract visible text into `content`
    pub extract_text: bool,
    /// Collect `<a href>` targets
    pub extract_links: bool,
    /// Collect `<img src>` targets
    pub extract_images: bool,
    /// Remove embedded/active elements, ad-like elements and empty containers
    pub clean_html: bool,
    /// Remove `<script>` elements
    pub remove_scripts: bool,
    /// Remove `<style>` elements
    pub remove_styles: bool,
    /// Consult and populate the content cache
    pub use_cache: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            extract_text: true,
            extract_links: true,
            extract_images: true,
            clean_html: true,
            remove_scripts: true,
            remove_styles: true,
            use_cache: true,
        }
    }
}
