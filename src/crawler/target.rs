use crate::url::{normalize_url, DomainScope};
use crate::UrlResult;
use std::collections::BTreeSet;
use url::Url;

/// One website to crawl, built once per input row
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    /// Identifier tying the result back to its input row
    pub site_id: usize,

    /// Normalized start URL
    pub seed_url: Url,

    /// Host restriction derived from the seed
    pub scope: DomainScope,
}

impl CrawlTarget {
    /// Builds a target from a raw website value
    ///
    /// Values without a scheme (`example.com`) are treated as `https://`.
    pub fn new(site_id: usize, website: &str) -> UrlResult<Self> {
        let website = website.trim();
        let candidate = if website.contains("://") {
            website.to_string()
        } else {
            format!("https://{}", website)
        };

        let seed_url = normalize_url(&candidate)?;
        let scope = DomainScope::from_url(&seed_url)?;

        Ok(Self {
            site_id,
            seed_url,
            scope,
        })
    }
}

/// Final output of one site crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlResult {
    /// Identifier of the originating target
    pub site_id: usize,

    /// Unique emails found on the site
    pub emails: BTreeSet<String>,

    /// Shortlisted team pages, best first
    pub team_pages: Vec<String>,

    /// Fetch attempts made (never more than `max_pages` per crawl pass)
    pub pages_visited: usize,

    /// Fetch attempts that did not yield a usable page
    pub pages_failed: usize,

    /// Set when the target could not be crawled at all
    pub error: Option<String>,
}

impl CrawlResult {
    /// Empty result for a target
    pub fn empty(site_id: usize) -> Self {
        Self {
            site_id,
            ..Self::default()
        }
    }

    /// Degraded result for a target that could not be crawled
    pub fn failed(site_id: usize, error: impl Into<String>) -> Self {
        Self {
            site_id,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Emails joined the way they are written to output
    pub fn emails_joined(&self) -> String {
        self.emails.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
