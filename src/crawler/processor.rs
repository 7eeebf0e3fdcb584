//! HTML processor for cleaning pages and extracting content
//!
//! This module turns a raw HTML document into the pieces of a
//! `ScrapedContent` record:
//! - Cleaning: active/embedded elements, ad-like elements, empty containers
//! - Title (`<title>`, then first `<h1>`, then `og:title`)
//! - Visible text from the main body
//! - Metadata from `<meta>` tags and the root `lang` attribute
//! - Absolute link and image URLs
//!
//! Steps run in a fixed order on one mutable document: cleaning, title,
//! text, metadata, links, images. Text extraction removes navigation
//! chrome (`nav`, `header`, `footer`, `aside`) from the document, so anchors
//! inside those elements are not collected when text is extracted.

use crate::content::{MetaValue, Metadata, ScrapeOptions};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements removed unconditionally when cleaning
const NOISE_ELEMENTS: &str = "script, style, noscript, iframe, embed, object";

/// Elements removed before text extraction
const CHROME_ELEMENTS: &str = "script, style, nav, footer, header, aside";

/// Case-insensitive `class`/`id` substrings marking an element as ad-like
const AD_MARKERS: &[&str] = &["ad", "spam", "banner"];

/// Containers dropped when they hold no text
const EMPTY_CANDIDATES: &str = "p, div, span";

/// Everything extracted from one HTML document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedPage {
    pub title: String,
    pub content: String,
    pub metadata: Metadata,
    pub links: Vec<String>,
    pub images: Vec<String>,
}

/// Processes an HTML document according to `options`
///
/// # Arguments
///
/// * `html` - The HTML source
/// * `base_url` - The page URL, used to resolve relative links and images
/// * `options` - Which cleaning and extraction steps to run
///
/// # Example
///
/// ```
/// use gleaner::content::ScrapeOptions;
/// use gleaner::crawler::process_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>T</title></head><body><p class="ad">x</p><p>keep</p></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = process_html(html, &base_url, &ScrapeOptions::default());
/// assert_eq!(page.title, "T");
/// assert_eq!(page.content, "keep");
/// ```
pub fn process_html(html: &str, base_url: &Url, options: &ScrapeOptions) -> ProcessedPage {
    let mut document = Html::parse_document(html);

    if options.clean_html {
        clean_document(&mut document);
    }
    if options.remove_scripts {
        detach_matching(&mut document, "script");
    }
    if options.remove_styles {
        detach_matching(&mut document, "style");
    }

    let title = extract_title(&document);
    let content = if options.extract_text {
        extract_text(&mut document)
    } else {
        String::new()
    };
    let metadata = extract_metadata(&document);
    let links = if options.extract_links {
        extract_urls(&document, "a[href]", "href", base_url)
    } else {
        Vec::new()
    };
    let images = if options.extract_images {
        extract_urls(&document, "img[src]", "src", base_url)
    } else {
        Vec::new()
    };

    ProcessedPage {
        title,
        content,
        metadata,
        links,
        images,
    }
}

/// Removes noise elements, ad-like elements and empty containers
///
/// The empty-container pass runs once: a container left empty only because
/// its children were removed in this same pass is not revisited.
pub fn clean_document(document: &mut Html) {
    detach_matching(document, NOISE_ELEMENTS);
    detach_where(document, "[class], [id]", is_ad_like);
    detach_where(document, EMPTY_CANDIDATES, |element| {
        collapse_whitespace(&element.text().collect::<String>()).is_empty()
    });
}

/// Elements never treated as ad-like, whatever their `class`/`id`
const STRUCTURAL_ELEMENTS: &[&str] = &["html", "head", "body"];

fn is_ad_like(element: ElementRef<'_>) -> bool {
    let value = element.value();
    if STRUCTURAL_ELEMENTS.contains(&value.name()) {
        return false;
    }
    [value.attr("class"), value.attr("id")]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .any(|attr| AD_MARKERS.iter().any(|marker| attr.contains(marker)))
}

/// Detaches every element matching `css` from the tree
fn detach_matching(document: &mut Html, css: &str) {
    detach_where(document, css, |_| true);
}

/// Detaches every element matching `css` for which `predicate` holds
///
/// Matches are collected first and detached afterwards, so the predicate
/// always sees the document as it was before this call.
fn detach_where<F>(document: &mut Html, css: &str, predicate: F)
where
    F: Fn(ElementRef<'_>) -> bool,
{
    let selector = match Selector::parse(css) {
        Ok(s) => s,
        Err(_) => return,
    };

    let ids: Vec<_> = select_attached(document, &selector)
        .filter(|element| predicate(*element))
        .map(|element| element.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Collapses runs of whitespace to single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the document's root element, if it is still attached
fn root(document: &Html) -> Option<ElementRef<'_>> {
    document.tree.root().children().find_map(ElementRef::wrap)
}

/// Selects matches reachable from the document root
///
/// `Html::select` also visits detached nodes, so every query goes through the
/// root element instead.
fn select_attached<'a, 'b>(
    document: &'a Html,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    root(document)
        .into_iter()
        .flat_map(move |root| root.select(selector))
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    let found = select_attached(document, &selector).next();
    found
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    first_match(document, css).map(|meta| meta.value().attr("content").unwrap_or("").to_string())
}

/// Extracts the title: `<title>`, then first `<h1>`, then `og:title`
fn extract_title(document: &Html) -> String {
    if let Some(title) = first_match(document, "title").map(element_text) {
        if !title.is_empty() {
            return title;
        }
    }

    if let Some(h1) = first_match(document, "h1").map(element_text) {
        if !h1.is_empty() {
            return h1;
        }
    }

    meta_content(document, r#"meta[property="og:title"]"#).unwrap_or_default()
}

/// Extracts visible text from `body`, `main`, `article` or the whole document
fn extract_text(document: &mut Html) -> String {
    detach_matching(document, CHROME_ELEMENTS);
    let document: &Html = document;

    let text = ["body", "main", "article"]
        .iter()
        .find_map(|css| first_match(document, css))
        .or_else(|| root(document))
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default();

    collapse_whitespace(&text)
}

/// Extracts description, keywords, author, date and language
fn extract_metadata(document: &Html) -> Metadata {
    let mut metadata = Metadata::new();

    if let Some(description) = meta_content(document, r#"meta[name="description"]"#) {
        metadata.insert("description".to_string(), MetaValue::Text(description));
    }
    // og:description wins over the plain description
    if let Some(description) = meta_content(document, r#"meta[property="og:description"]"#) {
        metadata.insert("description".to_string(), MetaValue::Text(description));
    }

    if let Some(keywords) = meta_content(document, r#"meta[name="keywords"]"#) {
        let keywords = keywords.split(',').map(|k| k.trim().to_string()).collect();
        metadata.insert("keywords".to_string(), MetaValue::List(keywords));
    }

    if let Some(author) = meta_content(document, r#"meta[name="author"]"#) {
        metadata.insert("author".to_string(), MetaValue::Text(author));
    }

    if let Some(date) = meta_content(document, r#"meta[property="article:published_time"]"#) {
        metadata.insert("date".to_string(), MetaValue::Text(date));
    }

    let language = root(document)
        .and_then(|html| html.value().attr("lang"))
        .unwrap_or("en")
        .to_string();
    metadata.insert("language".to_string(), MetaValue::Text(language));

    metadata
}

/// Collects `attr` of every element matching `css`, resolved against
/// `base_url`, without duplicates, in document order
fn extract_urls(document: &Html, css: &str, attr: &str, base_url: &Url) -> Vec<String> {
    let selector = match Selector::parse(css) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let urls = select_attached(document, &selector)
        .filter_map(|element| element.value().attr(attr))
        .filter_map(|value| base_url.join(value.trim()).ok())
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect();
    urls
}
