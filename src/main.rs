//! Gleaner main entry point
//!
//! This is the command-line interface for the Gleaner scraping toolkit.

use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use gleaner::config::{load_config_with_hash, Config};
use gleaner::{CrawlOptions, OutputFormat, ScrapeOptions, ScrapedContent, WebScraper};
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Gleaner: a best-effort web gleaner
///
/// Gleaner scrapes pages into clean text records, crawls small sites
/// breadth-first, reads RSS/Atom feeds and calls JSON endpoints. Results are
/// printed to stdout as JSON.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version = "1.0.0")]
#[command(about = "A best-effort web gleaner", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape one or more pages
    Scrape {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,

        #[command(flatten)]
        options: ScrapeFlags,

        /// Also save each record in this format (json, txt, html)
        #[arg(long, value_name = "FORMAT")]
        save: Option<OutputFormat>,
    },

    /// Crawl a site breadth-first from a seed URL
    Crawl {
        #[arg(value_name = "SEED")]
        seed: String,

        /// Maximum number of pages (overrides the config)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Do not follow links
        #[arg(long)]
        no_follow: bool,

        /// Allowed domain, repeatable (overrides the config)
        #[arg(long = "allow", value_name = "DOMAIN")]
        allowed_domains: Vec<String>,

        /// Exclusion pattern, repeatable (added to the config)
        #[arg(long = "exclude", value_name = "PATTERN")]
        exclude_patterns: Vec<String>,

        #[command(flatten)]
        options: ScrapeFlags,

        /// Also save each record in this format (json, txt, html)
        #[arg(long, value_name = "FORMAT")]
        save: Option<OutputFormat>,
    },

    /// Read an RSS or Atom feed
    Feed {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Extract text matching CSS selectors from a page
    Extract {
        #[arg(value_name = "URL")]
        url: String,

        /// Named selector as NAME=CSS, repeatable
        #[arg(long = "select", value_name = "NAME=CSS", required = true, value_parser = parse_pair)]
        selectors: Vec<(String, String)>,
    },

    /// Call a JSON API endpoint
    Api {
        #[arg(value_name = "URL")]
        url: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// JSON request body (non-GET methods)
        #[arg(long, value_name = "JSON")]
        data: Option<String>,

        /// Extra header as NAME=VALUE, repeatable
        #[arg(short = 'H', long = "header", value_name = "NAME=VALUE", value_parser = parse_pair)]
        headers: Vec<(String, String)>,
    },

    /// Remove cached records
    ClearCache {
        /// Remove only this URL's entry
        #[arg(long)]
        url: Option<String>,
    },
}

/// Flags mapping onto `ScrapeOptions`; everything is on by default
#[derive(Args, Debug, Clone, Copy)]
struct ScrapeFlags {
    /// Skip visible-text extraction
    #[arg(long)]
    no_text: bool,

    /// Skip link extraction
    #[arg(long)]
    no_links: bool,

    /// Skip image extraction
    #[arg(long)]
    no_images: bool,

    /// Keep ads, embeds and empty containers
    #[arg(long)]
    no_clean: bool,

    /// Neither read nor write the cache
    #[arg(long)]
    no_cache: bool,
}

impl From<ScrapeFlags> for ScrapeOptions {
    fn from(flags: ScrapeFlags) -> Self {
        Self {
            extract_text: !flags.no_text,
            extract_links: !flags.no_links,
            extract_images: !flags.no_images,
            clean_html: !flags.no_clean,
            use_cache: !flags.no_cache,
            ..Self::default()
        }
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;
    let scraper = WebScraper::new(&config).context("Failed to initialize scraper")?;

    match cli.command {
        Command::Scrape {
            urls,
            options,
            save,
        } => {
            let results = scraper.scrape_pages(&urls, &options.into()).await;
            if results.is_empty() {
                bail!("No page could be scraped");
            }
            save_all(&scraper, &results, save)?;
            print_json(&results)?;
        }
        Command::Crawl {
            seed,
            max_pages,
            no_follow,
            allowed_domains,
            exclude_patterns,
            options,
            save,
        } => {
            let mut crawl = CrawlOptions::from_config(&config.crawl);
            crawl.scrape = options.into();
            if let Some(max_pages) = max_pages {
                crawl.max_pages = max_pages;
            }
            if no_follow {
                crawl.follow_links = false;
            }
            if !allowed_domains.is_empty() {
                crawl.allowed_domains = allowed_domains;
            }
            crawl.exclude_patterns.extend(exclude_patterns);

            let results = scraper.crawl_site(&seed, &crawl).await;
            save_all(&scraper, &results, save)?;
            print_json(&results)?;
        }
        Command::Feed { url } => {
            let items = scraper
                .read_feed(&url)
                .await
                .with_context(|| format!("Failed to read feed {}", url))?;
            print_json(&items)?;
        }
        Command::Extract { url, selectors } => {
            let selectors: BTreeMap<String, String> = selectors.into_iter().collect();
            let extracted = scraper
                .extract_data(&url, &selectors)
                .await
                .with_context(|| format!("Failed to extract from {}", url))?;
            print_json(&extracted)?;
        }
        Command::Api {
            url,
            method,
            data,
            headers,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|e| anyhow!("Invalid HTTP method '{}': {}", method, e))?;
            let body: Option<serde_json::Value> = data
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .context("Request body is not valid JSON")?;
            let headers: BTreeMap<String, String> = headers.into_iter().collect();

            let value = scraper
                .fetch_json(&url, method, body.as_ref(), &headers)
                .await
                .with_context(|| format!("API call to {} failed", url))?;
            print_json(&value)?;
        }
        Command::ClearCache { url } => match url {
            Some(url) => {
                if scraper.remove_cached(&url) {
                    println!("Removed cache entry for {}", url);
                } else {
                    println!("No cache entry for {}", url);
                }
            }
            None => println!("Removed {} cache entries", scraper.clear_cache()),
        },
    }

    Ok(())
}

/// Loads the config file if one was given, otherwise the defaults
fn load(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

fn save_all(
    scraper: &WebScraper,
    results: &[ScrapedContent],
    format: Option<OutputFormat>,
) -> anyhow::Result<()> {
    if let Some(format) = format {
        for content in results {
            scraper
                .save_to_file(content, None, format)
                .with_context(|| format!("Failed to save {}", content.url))?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the JSON results.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
