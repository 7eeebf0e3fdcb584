//! Crawler coordinator - breadth-first site crawl
//!
//! This module contains the crawl loop, which:
//! - Seeds a frontier with the start URL
//! - Scrapes pages one at a time in FIFO order
//! - Follows links that stay inside the allowed domains
//! - Stops after `max_pages` successful scrapes or when the frontier drains
//!
//! A failed page is logged and skipped; it is never re-queued and never
//! fails the crawl.

use crate::config::CrawlConfig;
use crate::content::{ScrapeOptions, ScrapedContent};
use crate::crawler::frontier::Frontier;
use crate::crawler::scraper::WebScraper;
use crate::url::LinkFilter;

/// Options for one site crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of pages to return
    pub max_pages: usize,
    /// Queue links found on scraped pages
    pub follow_links: bool,
    /// Network locations a followed link may have; empty means the seed's only
    pub allowed_domains: Vec<String>,
    /// Substrings that rule a link out
    pub exclude_patterns: Vec<String>,
    /// Options for each page scrape
    pub scrape: ScrapeOptions,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self::from_config(&CrawlConfig::default())
    }
}

impl CrawlOptions {
    /// Builds crawl options from the `[crawl]` config section
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            follow_links: config.follow_links,
            allowed_domains: config.allowed_domains.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
            scrape: ScrapeOptions::default(),
        }
    }
}

/// State of one crawl: the frontier, the link filter and the results
pub struct Coordinator<'a> {
    scraper: &'a WebScraper,
    options: &'a CrawlOptions,
    frontier: Frontier,
    filter: LinkFilter,
    results: Vec<ScrapedContent>,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator for a crawl starting at `seed_url`
    pub fn new(scraper: &'a WebScraper, seed_url: &str, options: &'a CrawlOptions) -> Self {
        Self {
            scraper,
            options,
            frontier: Frontier::new(seed_url),
            filter: LinkFilter::new(seed_url, &options.allowed_domains, &options.exclude_patterns),
            results: Vec::new(),
        }
    }

    fn under_limit(&self) -> bool {
        self.results.len() < self.options.max_pages
    }

    /// Runs the crawl loop to completion
    pub async fn run(mut self) -> Vec<ScrapedContent> {
        tracing::info!(
            "Starting crawl (max {} pages, allowed domains: {})",
            self.options.max_pages,
            self.filter.allowed_domains().join(", ")
        );

        while self.under_limit() {
            let url = match self.frontier.pop_next() {
                Some(url) => url,
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
            };

            tracing::debug!("Processing URL: {}", url);
            let content = match self.scraper.scrape_page(&url, &self.options.scrape).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            let links = if self.options.follow_links {
                content.links.clone()
            } else {
                Vec::new()
            };
            self.results.push(content);

            if self.under_limit() {
                let queued = links
                    .iter()
                    .filter(|link| self.filter.allows(link))
                    .filter(|link| self.frontier.enqueue(link.as_str()))
                    .count();
                tracing::debug!("Queued {} new links from {}", queued, url);
            }

            tracing::info!(
                "Progress: {}/{} pages scraped, {} in frontier",
                self.results.len(),
                self.options.max_pages,
                self.frontier.len()
            );

            self.scraper.pause().await;
        }

        tracing::info!(
            "Crawl finished: {} pages scraped, {} URLs visited",
            self.results.len(),
            self.frontier.visited_count()
        );
        self.results
    }
}

impl WebScraper {
    /// Crawls a site breadth-first starting at `seed_url`
    ///
    /// Pages are scraped strictly in discovery order. Links are followed when
    /// `follow_links` is set and fewer than `max_pages` results exist; a link
    /// qualifies when its network location is the seed's or an allowed
    /// domain and it contains no exclusion pattern. The politeness delay
    /// follows every successful scrape. Failed pages are skipped.
    ///
    /// # Returns
    ///
    /// At most `max_pages` records, in the order they were scraped
    pub async fn crawl_site(&self, seed_url: &str, options: &CrawlOptions) -> Vec<ScrapedContent> {
        Coordinator::new(self, seed_url, options).run().await
    }
}
