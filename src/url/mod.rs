//! URL handling module for Lead-Harvest
//!
//! This module provides URL normalization, domain scoping, and origin
//! extraction used by the per-site crawler.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, origin_url, DomainScope};
pub use normalize::normalize_url;
