//! Gleaner: a best-effort web gleaner
//!
//! This crate implements a small scraping toolkit for agent scripts: a
//! retrying HTTP fetcher, an HTML cleaner/extractor, a disk-backed content
//! cache, a polite breadth-first site crawler, an RSS/Atom feed reader and a
//! CSS-selector extractor.

pub mod config;
pub mod content;
pub mod crawler;
pub mod feed;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Errors raised by the HTTP fetcher once retries are exhausted
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),
}

impl FetchError {
    /// Returns the HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors for input that leaves no usable structure behind
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use content::{MetaValue, Metadata, ScrapeOptions, ScrapedContent};
pub use crawler::{CrawlOptions, Fetcher, WebScraper};
pub use feed::FeedItem;
pub use output::OutputFormat;
