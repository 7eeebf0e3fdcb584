//! Disk-backed content cache
//!
//! Layout: one file per URL, `cache_<sha256 hex>.json`, holding the full
//! serialized record. There is no index; a file's presence is the entry.

use crate::content::ScrapedContent;
use crate::storage::traits::{CacheResult, ContentCache};
use crate::storage::cache_key;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "cache_";
const FILE_SUFFIX: &str = ".json";
const TEMP_SUFFIX: &str = ".json.tmp";

/// Content cache storing one JSON file per URL in a directory
#[derive(Debug, Clone)]
pub struct DiskCache {
    directory: PathBuf,
}

impl DiskCache {
    /// Opens a cache rooted at `directory`, creating the directory if needed
    ///
    /// The directory exists once this returns, so no later operation has to
    /// create it.
    ///
    /// # Returns
    ///
    /// * `Ok(DiskCache)` - The cache handle
    /// * `Err(CacheError)` - The directory could not be created
    pub fn open(directory: impl Into<PathBuf>) -> CacheResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        tracing::debug!("Opened content cache at {}", directory.display());
        Ok(Self { directory })
    }

    /// Returns the cache directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the file that holds (or would hold) the entry for `url`
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", FILE_PREFIX, cache_key(url), FILE_SUFFIX))
    }

    fn is_entry_file(path: &Path) -> bool {
        Self::has_cache_name(path, FILE_SUFFIX)
    }

    /// A write that was interrupted before its rename
    fn is_temp_file(path: &Path) -> bool {
        Self::has_cache_name(path, TEMP_SUFFIX)
    }

    fn has_cache_name(path: &Path, suffix: &str) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(suffix))
            .unwrap_or(false)
    }
}

impl ContentCache for DiskCache {
    fn get(&self, url: &str) -> CacheResult<Option<ScrapedContent>> {
        let raw = match fs::read_to_string(self.entry_path(url)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let content: ScrapedContent = serde_json::from_str(&raw)?;
        Ok(Some(content.with_recomputed_word_count()))
    }

    fn put(&self, url: &str, content: &ScrapedContent) -> CacheResult<()> {
        let path = self.entry_path(url);
        let json = serde_json::to_string(content)?;

        // Write-then-rename so readers never see a half-written entry
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, url: &str) -> CacheResult<bool> {
        match fs::remove_file(self.entry_path(url)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every entry, skipping files that cannot be removed
    ///
    /// Leftover temporary files are removed too but not counted.
    fn clear(&self) -> CacheResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.directory)? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!("Could not read cache directory entry: {}", e);
                    continue;
                }
            };

            let is_entry = Self::is_entry_file(&path);
            if !is_entry && !Self::is_temp_file(&path) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) if is_entry => removed += 1,
                Ok(()) => {}
                Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}
