//! Frontier management for a single site crawl
//!
//! This module handles:
//! - Priority classification of discovered links (contact/team keywords)
//! - Two FIFO queues with High-priority entries always drained first
//! - Visited/queued deduplication by normalized URL
//! - Domain scope restriction
//! - Bounding memory on large sites by capping the Normal queue

use crate::url::{normalize_url, DomainScope};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Keywords marking a link as a likely contact or team page
///
/// Matched case-insensitively against both the href and the anchor text.
pub const PRIORITY_KEYWORDS: &[&str] = &[
    "about",
    "contact",
    "team",
    "kontakt",
    "über",
    "uber",
    "ueber",
    "impressum",
];

/// Priority class of a frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Link text or href matches a contact/team keyword
    High,

    /// Any other in-scope link
    Normal,
}

/// Classifies a link by its href and anchor text
pub fn classify_priority(href: &str, anchor_text: &str) -> Priority {
    let href = href.to_lowercase();
    let text = anchor_text.to_lowercase();

    if PRIORITY_KEYWORDS
        .iter()
        .any(|keyword| href.contains(keyword) || text.contains(keyword))
    {
        Priority::High
    } else {
        Priority::Normal
    }
}

/// Owns the traversal state of one crawl target
///
/// The frontier is private to one `SiteCrawler` run and is never shared
/// across targets, so it needs no locking.
#[derive(Debug)]
pub struct Frontier {
    /// URLs outside this scope are never queued
    scope: DomainScope,

    /// Fallback seed when `seed` is called with no URLs
    seed_url: Url,

    /// High-priority entries (FIFO)
    high: VecDeque<Url>,

    /// Normal-priority entries (FIFO, capped)
    normal: VecDeque<Url>,

    /// Normalized keys of everything currently queued
    queued: HashSet<String>,

    /// Normalized keys of everything already fetched, in fetch order
    visited: HashSet<String>,
    visited_order: Vec<Url>,

    /// Page budget for this crawl
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier for the given seed and scope
    pub fn new(seed_url: Url, scope: DomainScope, max_pages: usize) -> Self {
        Self {
            scope,
            seed_url,
            high: VecDeque::new(),
            normal: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            visited_order: Vec::new(),
            max_pages,
        }
    }

    /// Initializes the pending queue
    ///
    /// Seeds keep their order and are not subject to the Normal queue cap.
    /// If `urls` is empty the target's seed URL is used instead.
    pub fn seed(&mut self, urls: Vec<Url>) {
        let urls = if urls.is_empty() {
            vec![self.seed_url.clone()]
        } else {
            urls
        };

        for url in urls {
            if let Some(url) = self.admit(&url) {
                tracing::trace!("Seeding frontier with {}", url);
                self.queued.insert(url.to_string());
                self.normal.push_back(url);
            }
        }
    }

    /// Pops the next URL to fetch
    ///
    /// High-priority entries are always returned before Normal ones. Returns
    /// None once the frontier is exhausted.
    pub fn next(&mut self) -> Option<Url> {
        if self.is_exhausted() {
            return None;
        }

        let url = self.high.pop_front().or_else(|| self.normal.pop_front())?;
        self.queued.remove(url.as_str());
        Some(url)
    }

    /// Offers a discovered URL to the frontier
    ///
    /// The URL is rejected if it is out of scope, already visited, already
    /// queued, or (for Normal priority only) the Normal queue is at its cap of
    /// `2 × max_pages`. Returns true if the URL was queued.
    pub fn offer(&mut self, url: &Url, priority: Priority) -> bool {
        let Some(url) = self.admit(url) else {
            return false;
        };

        match priority {
            Priority::High => {
                tracing::trace!("Queued high-priority {}", url);
                self.queued.insert(url.to_string());
                self.high.push_back(url);
                true
            }
            Priority::Normal => {
                if self.normal.len() >= self.normal_capacity() {
                    tracing::trace!("Normal queue full, dropping {}", url);
                    return false;
                }
                self.queued.insert(url.to_string());
                self.normal.push_back(url);
                true
            }
        }
    }

    /// Records a URL as fetched; idempotent
    ///
    /// Out-of-scope URLs are never recorded.
    pub fn mark_visited(&mut self, url: &Url) {
        let Ok(normalized) = normalize_url(url.as_str()) else {
            return;
        };
        if !self.scope.contains(&normalized) {
            return;
        }

        let key = normalized.to_string();
        self.queued.remove(&key);
        if self.visited.insert(key) {
            self.visited_order.push(normalized);
        }
    }

    /// Returns true if the URL has already been fetched
    pub fn is_visited(&self, url: &Url) -> bool {
        normalize_url(url.as_str())
            .map(|normalized| self.visited.contains(normalized.as_str()))
            .unwrap_or(false)
    }

    /// Returns true when the queues are empty or the page budget is spent
    pub fn is_exhausted(&self) -> bool {
        (self.high.is_empty() && self.normal.is_empty()) || self.visited.len() >= self.max_pages
    }

    /// Number of pages fetched so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs waiting to be fetched
    pub fn pending_count(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    /// Fetched URLs in the order they were fetched
    pub fn visited_urls(&self) -> &[Url] {
        &self.visited_order
    }

    /// URLs still waiting in the queues, High first
    pub fn pending_urls(&self) -> impl Iterator<Item = &Url> {
        self.high.iter().chain(self.normal.iter())
    }

    /// The scope this frontier enforces
    pub fn scope(&self) -> &DomainScope {
        &self.scope
    }

    fn normal_capacity(&self) -> usize {
        self.max_pages.saturating_mul(2)
    }

    /// Normalizes a URL and checks scope and deduplication
    fn admit(&self, url: &Url) -> Option<Url> {
        let normalized = normalize_url(url.as_str()).ok()?;

        if !self.scope.contains(&normalized) {
            tracing::trace!("Out of scope: {}", normalized);
            return None;
        }

        let key = normalized.as_str();
        if self.visited.contains(key) || self.queued.contains(key) {
            return None;
        }

        Some(normalized)
    }
}
