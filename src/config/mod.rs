//! Configuration module for Gleaner
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so `Config::default()` is a complete configuration.
//!
//! # Example
//!
//! ```no_run
//! use gleaner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gleaner.toml")).unwrap();
//! println!("Fetcher will try each URL {} times", config.fetcher.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlConfig, FetcherConfig, OutputConfig, ScraperConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
