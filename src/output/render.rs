//! Renderers for the saved-file formats

use crate::content::ScrapedContent;
use crate::output::traits::OutputResult;
use html_escape::encode_text;

/// Width of the separator line in `txt` output
const SEPARATOR_WIDTH: usize = 50;

/// Renders the full record as pretty-printed JSON
pub fn render_json(content: &ScrapedContent) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(content)?)
}

/// Renders a `Title`/`URL`/`Date`/`Word Count` header, a dash separator and the content
pub fn render_txt(content: &ScrapedContent) -> String {
    let mut txt = String::new();

    txt.push_str(&format!("Title: {}\n", content.title));
    txt.push_str(&format!("URL: {}\n", content.url));
    txt.push_str(&format!("Date: {}\n", content.timestamp));
    txt.push_str(&format!("Word Count: {}\n", content.word_count));
    txt.push_str(&"-".repeat(SEPARATOR_WIDTH));
    txt.push('\n');
    txt.push_str(&content.content);

    txt
}

/// Renders a minimal HTML page; all record text is escaped
pub fn render_html(content: &ScrapedContent) -> String {
    let title = encode_text(&content.title);
    let mut html = String::new();

    html.push_str(&format!("<html><head><title>{}</title></head>", title));
    html.push_str(&format!("<body><h1>{}</h1>", title));
    html.push_str(&format!(
        "<p><strong>URL:</strong> {}</p>",
        encode_text(&content.url)
    ));
    html.push_str(&format!(
        "<p><strong>Date:</strong> {}</p>",
        encode_text(&content.timestamp)
    ));
    html.push_str(&format!(
        "<div>{}</div></body></html>",
        encode_text(&content.content)
    ));

    html
}
