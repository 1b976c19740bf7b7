//! State module for tracking crawl progress
//!
//! This module provides the state kept by one site crawl.
//!
//! # Components
//!
//! - `CrawlPhase`: The phase of a site crawl (seeded, fetching, extracting, done)
//! - `PolitenessGate`: Enforces the fixed delay between fetches of one crawler

mod crawl_phase;
mod politeness;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use politeness::PolitenessGate;
