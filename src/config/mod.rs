//! Configuration module for Lead-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The configuration is loaded once at startup and passed down explicitly.
//!
//! # Example
//!
//! ```no_run
//! use lead_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling at most {} pages per site", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlMode, CrawlerConfig, EnrichmentConfig, InputConfig, OutputConfig,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
