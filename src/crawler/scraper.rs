//! Page scraper
//!
//! `WebScraper` ties the fetcher, the HTML processor and the content cache
//! together. It owns:
//! - The retrying `Fetcher`
//! - An optional cache handle
//! - The politeness delay used by batch scrapes and crawls
//! - The output directory for saved records
//!
//! Every network call is awaited before the next one starts.

use crate::config::Config;
use crate::content::{ScrapeOptions, ScrapedContent};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::processor::process_html;
use crate::output::{self, OutputFormat};
use crate::storage::{ContentCache, DiskCache};
use crate::{ParseError, Result};
use reqwest::Method;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Scrapes pages, feeds and JSON endpoints
pub struct WebScraper {
    fetcher: Fetcher,
    cache: Option<Box<dyn ContentCache>>,
    delay: Duration,
    output_dir: PathBuf,
}

impl WebScraper {
    /// Creates a scraper from configuration
    ///
    /// The cache directory is created here when caching is enabled. If it
    /// cannot be created the scraper runs without a cache.
    ///
    /// # Returns
    ///
    /// * `Ok(WebScraper)` - The scraper
    /// * `Err(ScrapeError)` - The HTTP client or header set could not be built
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetcher, &config.user_agent)?;

        let cache: Option<Box<dyn ContentCache>> = if config.cache.enabled {
            match DiskCache::open(&config.cache.directory) {
                Ok(cache) => Some(Box::new(cache)),
                Err(e) => {
                    tracing::warn!(
                        "Cache disabled, could not open {}: {}",
                        config.cache.directory.display(),
                        e
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            fetcher,
            cache,
            delay: config.scraper.delay(),
            output_dir: config.output.directory.clone(),
        })
    }

    /// Replaces the cache handle
    pub fn with_cache(mut self, cache: Option<Box<dyn ContentCache>>) -> Self {
        self.cache = cache;
        self
    }

    /// Returns the underlying fetcher
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Returns the politeness delay between requests
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the directory `save_to_file` writes into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Scrapes a single page
    ///
    /// With `use_cache`, a cached record is returned without touching the
    /// network and a fresh record is written back to the cache. Cache
    /// failures are logged and otherwise ignored. Failed scrapes are never
    /// cached.
    ///
    /// # Arguments
    ///
    /// * `url` - The page URL; the record and cache key use this exact string
    /// * `options` - Cleaning and extraction options
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapedContent)` - The scraped (or cached) record
    /// * `Err(ScrapeError)` - The URL is invalid or the fetch failed
    pub async fn scrape_page(&self, url: &str, options: &ScrapeOptions) -> Result<ScrapedContent> {
        if options.use_cache {
            if let Some(cached) = self.cached(url) {
                tracing::info!("Using cached content for {}", url);
                return Ok(cached);
            }
        }

        tracing::info!("Scraping {}", url);
        let content = self.fetch_and_process(url, options).await.map_err(|e| {
            tracing::error!("Failed to scrape {}: {}", url, e);
            e
        })?;

        if options.use_cache {
            self.store(url, &content);
        }

        tracing::info!(
            "Successfully scraped {} ({} words)",
            url,
            content.word_count
        );
        Ok(content)
    }

    async fn fetch_and_process(&self, url: &str, options: &ScrapeOptions) -> Result<ScrapedContent> {
        let base_url = Url::parse(url).map_err(|source| ParseError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let response = self.fetcher.fetch(url).await?;
        if response.final_url != base_url.as_str() {
            tracing::debug!("{} redirected to {}", url, response.final_url);
        }
        let html = response.text();
        let page = process_html(&html, &base_url, options);

        Ok(ScrapedContent::new(
            url,
            response.status,
            page.title,
            page.content,
            page.metadata,
            page.links,
            page.images,
        ))
    }

    /// Scrapes several pages in order
    ///
    /// Failed pages are logged and skipped. The politeness delay is applied
    /// after each successful scrape except the last URL.
    pub async fn scrape_pages(&self, urls: &[String], options: &ScrapeOptions) -> Vec<ScrapedContent> {
        let mut results = Vec::with_capacity(urls.len());

        for (i, url) in urls.iter().enumerate() {
            match self.scrape_page(url, options).await {
                Ok(content) => {
                    results.push(content);
                    if i + 1 < urls.len() {
                        self.pause().await;
                    }
                }
                Err(e) => tracing::warn!("Skipping {}: {}", url, e),
            }
        }

        results
    }

    /// Calls a JSON endpoint
    ///
    /// `GET` goes through the retrying fetcher. Other methods send exactly
    /// one request carrying `body` as JSON.
    ///
    /// # Arguments
    ///
    /// * `url` - The endpoint
    /// * `method` - HTTP method
    /// * `body` - JSON request body (ignored for `GET`)
    /// * `headers` - Headers replacing the defaults for this call
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The decoded response body
    /// * `Err(ScrapeError)` - The request failed or the body is not JSON
    pub async fn fetch_json(
        &self,
        url: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        headers: &BTreeMap<String, String>,
    ) -> Result<serde_json::Value> {
        tracing::info!("Calling API {} {}", method, url);

        let response = if method == Method::GET {
            self.fetcher.fetch_with_headers(url, headers).await
        } else {
            self.fetcher.send_once(method, url, body, headers).await
        }
        .map_err(|e| {
            tracing::error!("API call to {} failed: {}", url, e);
            e
        })?;

        let value = serde_json::from_slice(&response.body).map_err(|source| ParseError::Json {
            url: url.to_string(),
            source,
        })?;

        tracing::info!("API call to {} succeeded", url);
        Ok(value)
    }

    /// Saves a record into the output directory
    ///
    /// Without a filename the record is saved as
    /// `scraped_<first 8 hex chars of the URL hash>.<ext>`.
    pub fn save_to_file(
        &self,
        content: &ScrapedContent,
        filename: Option<&str>,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        output::save_to_file(content, &self.output_dir, filename, format).map_err(|e| {
            tracing::error!("Failed to save content for {}: {}", content.url, e);
            e.into()
        })
    }

    /// Removes the cached record for `url`
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed
    pub fn remove_cached(&self, url: &str) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        match cache.remove(url) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!("Failed to remove cache entry for {}: {}", url, e);
                false
            }
        }
    }

    /// Removes every cached record
    ///
    /// # Returns
    ///
    /// The number of entries removed
    pub fn clear_cache(&self) -> usize {
        let Some(cache) = &self.cache else {
            return 0;
        };
        match cache.clear() {
            Ok(count) => {
                tracing::info!("Cleared {} cache entries", count);
                count
            }
            Err(e) => {
                tracing::warn!("Failed to clear cache: {}", e);
                0
            }
        }
    }

    /// Sleeps for the politeness delay
    pub(crate) async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn cached(&self, url: &str) -> Option<ScrapedContent> {
        let cache = self.cache.as_ref()?;
        match cache.get(url) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry for {}: {}", url, e);
                None
            }
        }
    }

    fn store(&self, url: &str, content: &ScrapedContent) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, content) {
                tracing::warn!("Failed to cache content for {}: {}", url, e);
            }
        }
    }
}
