//! Cache traits and error types
//!
//! This module defines the trait interface for content cache backends and
//! the associated error type. Backends report every failure; the scraper
//! decides that a failed lookup is a miss and a failed write is a no-op.

use crate::content::ScrapedContent;
use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for content cache backends
///
/// Entries are keyed by URL string and never expire; they stay valid until
/// removed or cleared.
pub trait ContentCache: Send + Sync {
    /// Looks up the record cached for `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(content))` - A cached record exists
    /// * `Ok(None)` - Nothing is cached for this URL
    /// * `Err(CacheError)` - The entry exists but could not be read
    fn get(&self, url: &str) -> CacheResult<Option<ScrapedContent>>;

    /// Stores `content` as the record for `url`, replacing any previous entry
    fn put(&self, url: &str, content: &ScrapedContent) -> CacheResult<()>;

    /// Removes the entry for `url`
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed
    fn remove(&self, url: &str) -> CacheResult<bool>;

    /// Removes every entry, returning how many were removed
    fn clear(&self) -> CacheResult<usize>;
}
