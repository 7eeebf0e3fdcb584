//! Output module for saving scraped records to files
//!
//! This module handles:
//! - The supported file formats (`json`, `txt`, `html`)
//! - Rendering a record in each format
//! - Writing rendered records into the output directory

mod render;
mod traits;

pub use render::{render_html, render_json, render_txt};
pub use traits::{OutputError, OutputFormat, OutputResult};

use crate::content::ScrapedContent;
use crate::storage::cache_key;
use std::fs;
use std::path::{Path, PathBuf};

/// Renders `content` in `format`
pub fn render(content: &ScrapedContent, format: OutputFormat) -> OutputResult<String> {
    match format {
        OutputFormat::Json => render_json(content),
        OutputFormat::Txt => Ok(render_txt(content)),
        OutputFormat::Html => Ok(render_html(content)),
    }
}

/// Default file name for a record: `scraped_<first 8 hex chars of the URL hash>.<ext>`
pub fn default_filename(content: &ScrapedContent, format: OutputFormat) -> String {
    let hash = cache_key(&content.url);
    format!("scraped_{}.{}", &hash[..8], format.extension())
}

/// Saves a record into `directory`
///
/// # Arguments
///
/// * `content` - The record to save
/// * `directory` - Output directory, created if missing
/// * `filename` - File name inside `directory`; derived from the URL when `None`
/// * `format` - File format
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Rendering or writing failed
pub fn save_to_file(
    content: &ScrapedContent,
    directory: &Path,
    filename: Option<&str>,
    format: OutputFormat,
) -> OutputResult<PathBuf> {
    let rendered = render(content, format)?;

    fs::create_dir_all(directory)?;
    let path = match filename {
        Some(name) => directory.join(name),
        None => directory.join(default_filename(content, format)),
    };
    fs::write(&path, rendered)?;

    tracing::info!("Saved content to {}", path.display());
    Ok(path)
}
