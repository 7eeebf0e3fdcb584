//! Storage module for the content cache
//!
//! This module handles persisting scraped records between runs:
//! - A backend-agnostic `ContentCache` trait
//! - `DiskCache`, one JSON file per URL named by a hash of the URL
//! - Cache key derivation

mod disk;
mod traits;

pub use disk::DiskCache;
pub use traits::{CacheError, CacheResult, ContentCache};

use sha2::{Digest, Sha256};

/// Derives the cache key for a URL: the hex-encoded SHA-256 of the URL string
///
/// The raw URL is never used as a filename, which keeps names filesystem-safe
/// and bounded in length. Two URLs sharing a digest would share an entry; at
/// 256 bits that is not a practical concern.
///
/// # Examples
///
/// ```
/// use gleaner::storage::cache_key;
///
/// let key = cache_key("https://example.com/");
/// assert_eq!(key.len(), 64);
/// assert_eq!(key, cache_key("https://example.com/"));
/// ```
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
