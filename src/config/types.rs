use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Gleaner
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler (optional)
    #[serde(rename = "contact-url", default)]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Mozilla/5.0 (compatible; Name/Version; +ContactURL)`, with the
    /// contact part omitted when no contact URL is configured.
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!(
                "Mozilla/5.0 (compatible; {}/{})",
                self.crawler_name, self.crawler_version
            )
        } else {
            format!(
                "Mozilla/5.0 (compatible; {}/{}; +{})",
                self.crawler_name, self.crawler_version, self.contact_url
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: String::new(),
        }
    }
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total number of attempts per request
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit; attempt `n` sleeps `2^n` units before retrying (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Header overrides applied to every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            headers: BTreeMap::new(),
        }
    }
}

/// Page scraper configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Politeness delay between consecutive requests (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl ScraperConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

/// Content cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether the disk cache is opened at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one JSON file per cached URL
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: default_cache_dir(),
        }
    }
}

/// Output configuration for saved records
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory where `save_to_file` writes
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
        }
    }
}

/// Default crawl bounds used by the CLI
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of pages returned by one crawl
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Whether discovered links are followed
    #[serde(rename = "follow-links", default = "default_true")]
    pub follow_links: bool,

    /// Domains (host or host:port, optionally `*.`-prefixed) links may lead to
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Substrings that exclude a link from the crawl
    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            follow_links: true,
            allowed_domains: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

fn default_crawler_name() -> String {
    "GleanerBot".to_string()
}

fn default_crawler_version() -> String {
    "1.0".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("scraper_cache")
}

fn default_max_pages() -> usize {
    10
}

fn default_true() -> bool {
    true
}
