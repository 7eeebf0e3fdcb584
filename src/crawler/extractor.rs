//! CSS-selector extraction over scraped content

use crate::content::{ScrapeOptions, ScrapedContent};
use crate::crawler::scraper::WebScraper;
use crate::{ParseError, Result, ScrapeError};
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Selector matches keyed by the caller's names
pub type Extracted = BTreeMap<String, Vec<String>>;

/// Parses every selector up front so a bad one fails before any fetch
fn compile_selectors(selectors: &BTreeMap<String, String>) -> Result<Vec<(&str, Selector)>> {
    selectors
        .iter()
        .map(|(name, css)| {
            Selector::parse(css)
                .map(|selector| (name.as_str(), selector))
                .map_err(|e| {
                    ScrapeError::from(ParseError::Selector {
                        selector: css.clone(),
                        message: e.to_string(),
                    })
                })
        })
        .collect()
}

/// Runs compiled selectors against the record's `content`
///
/// The content is parsed as an HTML document of its own. Since `content` is
/// already plain text, structural selectors such as `p` match nothing while
/// `body` or `html` match the whole text.
fn select_all(content: &ScrapedContent, selectors: &[(&str, Selector)]) -> Extracted {
    let document = Html::parse_document(&content.content);

    selectors
        .iter()
        .map(|(name, selector)| {
            let matches = document
                .select(selector)
                .map(|element| {
                    element
                        .text()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .collect::<String>()
                })
                .collect();
            (name.to_string(), matches)
        })
        .collect()
}

impl WebScraper {
    /// Extracts named selector matches from a page
    ///
    /// The page is scraped with default options (so the cache applies), then
    /// every selector is run against the scraped content. Each name is
    /// present in the result; a selector with no match maps to an empty list.
    ///
    /// # Arguments
    ///
    /// * `url` - The page URL
    /// * `selectors` - Name to CSS selector
    ///
    /// # Returns
    ///
    /// * `Ok(Extracted)` - Trimmed match text per name, in document order
    /// * `Err(ScrapeError)` - A selector is invalid or the scrape failed
    pub async fn extract_data(
        &self,
        url: &str,
        selectors: &BTreeMap<String, String>,
    ) -> Result<Extracted> {
        let compiled = compile_selectors(selectors)?;
        let content = self.scrape_page(url, &ScrapeOptions::default()).await?;
        Ok(select_all(&content, &compiled))
    }
}
