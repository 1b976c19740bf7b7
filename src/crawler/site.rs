//! Site crawler - per-target crawl orchestration
//!
//! This module drives one website to completion, including:
//! - Seeding the frontier
//! - Fetching pages strictly one at a time, behind the politeness gate
//! - Mining fetched pages for emails and prioritized links
//! - Team-page discovery (sitemap, bounded BFS fallback, ranking)
//!
//! Page-level failures never escape this module; the worst a target can
//! produce is a degraded [`CrawlResult`].

use crate::config::{CrawlMode, CrawlerConfig};
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::frontier::{classify_priority, Frontier};
use crate::crawler::sitemap::fetch_sitemap;
use crate::crawler::target::{CrawlResult, CrawlTarget};
use crate::extract::{extract_emails_chunked, DEFAULT_CHUNK_SIZE};
use crate::select::{KeywordTeamPageRanker, TeamPageRanker};
use crate::state::CrawlPhase;
use crate::url::normalize_url;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Per-target crawl limits
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Page budget of one crawl pass
    pub max_pages: usize,

    /// Decoded body cap per page
    pub max_page_bytes: usize,

    /// Fixed delay between two fetches of one target
    pub politeness_delay: Duration,

    /// Team pages kept on the shortlist
    pub team_page_count: usize,
}

impl CrawlSettings {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            max_page_bytes: config.max_page_bytes,
            politeness_delay: config.politeness_delay(),
            team_page_count: config.team_page_count,
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Crawls single websites
///
/// A `SiteCrawler` holds only shared, immutable pieces (HTTP client, limits,
/// ranker). All traversal state is created per call, so one crawler can serve
/// any number of concurrent targets.
#[derive(Clone)]
pub struct SiteCrawler {
    client: Client,
    settings: CrawlSettings,
    ranker: Arc<dyn TeamPageRanker>,
}

impl SiteCrawler {
    /// Creates a crawler using the keyword team-page ranker
    pub fn new(client: Client, settings: CrawlSettings) -> Self {
        Self {
            client,
            settings,
            ranker: Arc::new(KeywordTeamPageRanker),
        }
    }

    /// Replaces the team-page ranker
    pub fn with_ranker(mut self, ranker: Arc<dyn TeamPageRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Crawls a target in the given mode
    pub async fn crawl_with_mode(&self, target: &CrawlTarget, mode: CrawlMode) -> CrawlResult {
        match mode {
            CrawlMode::Emails => self.crawl(target).await,
            CrawlMode::TeamPages => self.crawl_team_pages(target).await,
        }
    }

    /// Harvests emails from a target, starting at its seed URL
    ///
    /// # Crawl Loop
    ///
    /// 1. Pop the next URL (High priority first)
    /// 2. Fetch it and record it as visited, whatever the outcome
    /// 3. On failure, log and move on
    /// 4. On success, extract emails and offer every outbound link
    ///
    /// The loop ends when the frontier is empty or `max_pages` fetches have
    /// been made.
    pub async fn crawl(&self, target: &CrawlTarget) -> CrawlResult {
        let mut fetcher = self.fetcher(target);
        let result = match self.harvest(target, Vec::new(), &mut fetcher).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Crawl of {} aborted: {}", target.seed_url, e);
                CrawlResult::failed(target.site_id, e.to_string())
            }
        };

        log_summary(target, &result);
        result
    }

    /// Shortlists team pages, then harvests emails starting from them
    ///
    /// The email crawl is seeded with the shortlisted pages followed by the
    /// site URL, so staff pages are mined before anything else.
    pub async fn crawl_team_pages(&self, target: &CrawlTarget) -> CrawlResult {
        let mut fetcher = self.fetcher(target);

        let outcome = async {
            let team_pages = self.find_team_pages(target, &mut fetcher).await?;

            let mut seeds: Vec<Url> = team_pages
                .iter()
                .filter_map(|page| normalize_url(page).ok())
                .collect();
            seeds.push(target.seed_url.clone());

            let mut result = self.harvest(target, seeds, &mut fetcher).await?;
            result.team_pages = team_pages;
            Ok::<_, crate::HarvestError>(result)
        }
        .await;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Team-page crawl of {} aborted: {}", target.seed_url, e);
                CrawlResult::failed(target.site_id, e.to_string())
            }
        };

        log_summary(target, &result);
        result
    }

    /// Finds the most likely team pages of a target
    ///
    /// # Strategy
    ///
    /// 1. Read the site's sitemap
    /// 2. If it is empty or unavailable, collect URLs with a bounded BFS
    /// 3. Hand the candidates to the ranker; fall back to keywords if it fails
    pub async fn discover_team_pages(&self, target: &CrawlTarget) -> Vec<String> {
        let mut fetcher = self.fetcher(target);
        match self.find_team_pages(target, &mut fetcher).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!("Team-page discovery for {} failed: {}", target.seed_url, e);
                Vec::new()
            }
        }
    }

    async fn find_team_pages(
        &self,
        target: &CrawlTarget,
        fetcher: &mut PageFetcher,
    ) -> crate::Result<Vec<String>> {
        let sitemap = fetch_sitemap(fetcher, &target.seed_url).await;

        let candidates: Vec<String> = if sitemap.is_empty() {
            tracing::debug!(
                "No sitemap for {}, falling back to crawling",
                target.seed_url
            );
            self.collect_urls(target, fetcher).await?
        } else {
            sitemap.iter().map(Url::to_string).collect()
        };

        let limit = self.settings.team_page_count;
        let shortlist = match self.ranker.rank_team_pages(&candidates, limit).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(
                    "Team-page ranking for {} failed, using keywords: {}",
                    target.seed_url,
                    e
                );
                KeywordTeamPageRanker::rank(&candidates, limit)
            }
        };

        tracing::debug!(
            "{}: {} team pages out of {} candidates",
            target.seed_url,
            shortlist.len(),
            candidates.len()
        );
        Ok(shortlist)
    }

    /// Bounded BFS collecting every visited or discovered URL
    async fn collect_urls(
        &self,
        target: &CrawlTarget,
        fetcher: &mut PageFetcher,
    ) -> crate::Result<Vec<String>> {
        let mut frontier = self.frontier(target, Vec::new());
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut phase = CrawlPhase::Seeded;

        while let Some(url) = frontier.next() {
            phase = phase.transition(CrawlPhase::Fetching)?;

            let page = fetcher.fetch(&url).await;
            frontier.mark_visited(&url);

            if !page.status.is_ok() {
                tracing::warn!("Skipping {} ({})", url, page.status);
                continue;
            }

            phase = phase.transition(CrawlPhase::Extracting)?;
            if seen.insert(url.to_string()) {
                urls.push(url.to_string());
            }
            for link in &page.outbound_links {
                if let Ok(normalized) = normalize_url(link.url.as_str()) {
                    if seen.insert(normalized.to_string()) {
                        urls.push(normalized.to_string());
                    }
                }
                frontier.offer(&link.url, classify_priority(&link.href, &link.text));
            }
        }

        phase.transition(CrawlPhase::Done)?;
        Ok(urls)
    }

    /// The email crawl loop shared by both modes
    async fn harvest(
        &self,
        target: &CrawlTarget,
        seeds: Vec<Url>,
        fetcher: &mut PageFetcher,
    ) -> crate::Result<CrawlResult> {
        let mut frontier = self.frontier(target, seeds);
        let mut result = CrawlResult::empty(target.site_id);
        let mut last_error = None;
        let mut phase = CrawlPhase::Seeded;

        while let Some(url) = frontier.next() {
            if frontier.is_visited(&url) {
                continue;
            }

            phase = phase.transition(CrawlPhase::Fetching)?;
            let page = fetcher.fetch(&url).await;
            frontier.mark_visited(&url);
            result.pages_visited += 1;

            if !page.status.is_ok() {
                result.pages_failed += 1;
                tracing::warn!(
                    "Skipping {} ({}): {}",
                    url,
                    page.status,
                    page.error.as_deref().unwrap_or("no details")
                );
                last_error = page.error.or_else(|| Some(page.status.to_string()));
                continue;
            }

            phase = phase.transition(CrawlPhase::Extracting)?;

            let found = extract_emails_chunked(&page.raw_text, DEFAULT_CHUNK_SIZE);
            if !found.is_empty() {
                tracing::debug!("{} emails on {}", found.len(), url);
            }
            result.emails.extend(found);

            for link in &page.outbound_links {
                let priority = classify_priority(&link.href, &link.text);
                frontier.offer(&link.url, priority);
            }
        }

        phase.transition(CrawlPhase::Done)?;

        if result.pages_visited > 0 && result.pages_failed == result.pages_visited {
            result.error = last_error;
        }

        Ok(result)
    }

    fn frontier(&self, target: &CrawlTarget, seeds: Vec<Url>) -> Frontier {
        let mut frontier = Frontier::new(
            target.seed_url.clone(),
            target.scope.clone(),
            self.settings.max_pages,
        );
        frontier.seed(seeds);
        frontier
    }

    fn fetcher(&self, target: &CrawlTarget) -> PageFetcher {
        PageFetcher::new(
            self.client.clone(),
            target.scope.clone(),
            self.settings.max_page_bytes,
            self.settings.politeness_delay,
        )
    }
}

fn log_summary(target: &CrawlTarget, result: &CrawlResult) {
    tracing::info!(
        "{}: {} pages visited, {} emails found, {} team pages",
        target.seed_url,
        result.pages_visited,
        result.emails.len(),
        result.team_pages.len()
    );
}
