//! Crawler module for page fetching, processing and site crawls
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry logic
//! - HTML cleaning and content extraction
//! - The page scraper with its cache handling
//! - CSS-selector extraction
//! - Breadth-first site crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod processor;
mod scraper;

pub use coordinator::{Coordinator, CrawlOptions};
pub use extractor::Extracted;
pub use fetcher::{
    backoff_delay, build_http_client, default_headers, merge_headers, FetchResponse, Fetcher,
};
pub use frontier::Frontier;
pub use processor::{clean_document, collapse_whitespace, process_html, ProcessedPage};
pub use self::scraper::WebScraper;

use crate::config::Config;
use crate::content::{ScrapeOptions, ScrapedContent};
use crate::Result;

/// Scrapes a single page with a scraper built from `config`
///
/// Convenience entry point for one-off calls; reuse a `WebScraper` when
/// scraping more than one page.
pub async fn scrape(config: &Config, url: &str, options: &ScrapeOptions) -> Result<ScrapedContent> {
    WebScraper::new(config)?.scrape_page(url, options).await
}

/// Crawls a site with a scraper and crawl options built from `config`
pub async fn crawl(config: &Config, seed_url: &str) -> Result<Vec<ScrapedContent>> {
    let scraper = WebScraper::new(config)?;
    let options = CrawlOptions::from_config(&config.crawl);
    Ok(scraper.crawl_site(seed_url, &options).await)
}
