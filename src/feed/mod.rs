//! RSS and Atom feed reading
//!
//! Feeds are fetched through the scraper's retrying fetcher and parsed with
//! `feed-rs`. A damaged feed yields the entries that can still be read, and
//! a body that is not a feed yields no items rather than an error.

use crate::crawler::WebScraper;
use crate::FetchError;
use encoding_rs::{Encoding, UTF_8};
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;
use serde::{Deserialize, Serialize};

/// One feed entry; every field is empty when the feed omits it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Publication date in RFC 2822 form
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub author: String,
}

/// Entry element names with the wrapper that turns one entry into a feed
const ENTRY_WRAPPERS: &[(&str, &str, &str)] = &[
    ("item", r#"<rss version="2.0"><channel>"#, "</channel></rss>"),
    ("entry", r#"<feed xmlns="http://www.w3.org/2005/Atom">"#, "</feed>"),
];

/// Parses an RSS or Atom document into feed items
///
/// `description` is the entry summary, falling back to the content body.
/// HTML entities in text fields are decoded.
///
/// When the document as a whole does not parse, every complete `<item>` or
/// `<entry>` element is parsed on its own and the ones that parse are kept.
/// A body with no parseable entries yields an empty list.
pub fn parse_feed(body: &[u8]) -> Vec<FeedItem> {
    let entries = match parser::parse(body) {
        Ok(feed) => feed.entries,
        Err(e) => {
            tracing::warn!("Could not parse feed, reading entries one by one: {}", e);
            parse_entries_individually(&decode_document(body))
        }
    };

    entries.into_iter().map(to_item).collect()
}

/// Decodes a feed body with the encoding its XML declaration names
///
/// A byte order mark wins; UTF-8 is the default.
fn decode_document(body: &[u8]) -> String {
    let prolog = String::from_utf8_lossy(&body[..body.len().min(200)]);
    let declared = prolog
        .find("?>")
        .map(|end| &prolog[..end])
        .and_then(|declaration| declaration.split_once("encoding="))
        .and_then(|(_, rest)| {
            let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
            rest[1..].split(quote).next()
        })
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    let (text, _, _) = declared.unwrap_or(UTF_8).decode(body);
    text.into_owned()
}

fn parse_entries_individually(text: &str) -> Vec<Entry> {
    let mut entries = Vec::new();

    for (tag, open, close) in ENTRY_WRAPPERS {
        for element in complete_elements(text, tag) {
            let wrapped = format!("{}{}{}", open, element, close);
            match parser::parse(wrapped.as_bytes()) {
                Ok(feed) => entries.extend(feed.entries),
                Err(e) => tracing::debug!("Skipping unparseable <{}>: {}", tag, e),
            }
        }
        if !entries.is_empty() {
            break;
        }
    }

    entries
}

/// Returns every `<tag ...>...</tag>` span in document order
///
/// An element without a closing tag ends the scan.
fn complete_elements<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut found = Vec::new();
    let mut offset = 0;

    while let Some(pos) = text[offset..].find(&open) {
        let start = offset + pos;
        let after_name = start + open.len();
        // `<items>` or `<entry-list>` are different elements
        if !text[after_name..].starts_with(|c: char| c == '>' || c == '/' || c.is_whitespace()) {
            offset = after_name;
            continue;
        }
        let Some(len) = text[after_name..].find(&close) else {
            break;
        };
        let end = after_name + len + close.len();
        found.push(&text[start..end]);
        offset = end;
    }

    found
}

fn to_item(entry: Entry) -> FeedItem {
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    FeedItem {
        title: entry
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default(),
        description: decode_html_entities(&description).to_string(),
        link: entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default(),
        pub_date: entry
            .published
            .map(|dt| dt.to_rfc2822())
            .unwrap_or_default(),
        author: entry
            .authors
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default(),
    }
}

impl WebScraper {
    /// Fetches and parses a feed
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<FeedItem>)` - The entries, empty when the body is not a feed
    /// * `Err(FetchError)` - The fetch failed after retries
    pub async fn read_feed(&self, feed_url: &str) -> Result<Vec<FeedItem>, FetchError> {
        tracing::info!("Reading feed {}", feed_url);

        let response = self.fetcher().fetch(feed_url).await.map_err(|e| {
            tracing::error!("Failed to fetch feed {}: {}", feed_url, e);
            e
        })?;
        let items = parse_feed(&response.body);

        tracing::info!("Read feed {} ({} items)", feed_url, items.len());
        Ok(items)
    }
}
