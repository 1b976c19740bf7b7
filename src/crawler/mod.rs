//! Crawler module for bounded single-site crawling
//!
//! This module contains the per-target crawling logic, including:
//! - HTTP fetching with size and time limits
//! - HTML parsing and link extraction
//! - Frontier management and link prioritization
//! - Sitemap discovery
//! - Overall site crawl orchestration

mod fetcher;
mod frontier;
mod parser;
mod site;
mod sitemap;
mod target;

pub use fetcher::{build_http_client, FetchStatus, PageFetchResult, PageFetcher};
pub use frontier::{classify_priority, Frontier, Priority, PRIORITY_KEYWORDS};
pub use parser::{extract_links, Link};
pub use site::{CrawlSettings, SiteCrawler};
pub use sitemap::{fetch_sitemap, MAX_CHILD_SITEMAPS};
pub use target::{CrawlResult, CrawlTarget};
