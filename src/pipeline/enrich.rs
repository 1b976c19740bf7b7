use crate::config::{CrawlMode, EnrichmentConfig, InputConfig};
use crate::crawler::{CrawlResult, CrawlTarget, SiteCrawler};
use crate::extract::extract_emails;
use crate::pipeline::rows::InputRow;
use crate::select::{ContactContext, ContactSelector, KeywordContactSelector};
use std::sync::Arc;

/// An input row together with everything learned about it
#[derive(Debug, Clone)]
pub struct EnrichedRow {
    /// The untouched input row
    pub row: InputRow,

    /// Crawl outcome (always present, possibly degraded)
    pub result: CrawlResult,

    /// Selected best email, when selection is enabled and a candidate fits
    pub best_email: Option<String>,

    /// True when the hint column made the crawl unnecessary
    pub crawl_skipped: bool,
}

impl EnrichedRow {
    /// A row that could not be enriched at all
    pub fn failed(row: InputRow, error: impl Into<String>) -> Self {
        let result = CrawlResult::failed(row.index, error);
        Self {
            row,
            result,
            best_email: None,
            crawl_skipped: false,
        }
    }
}

/// Turns one input row into one [`EnrichedRow`]
///
/// Never fails: rows without a usable website produce a result carrying an
/// error message instead.
pub struct RowEnricher {
    crawler: SiteCrawler,
    input: InputConfig,
    enrichment: EnrichmentConfig,
    selector: Option<Arc<dyn ContactSelector>>,
}

impl RowEnricher {
    /// Creates an enricher; best-email selection uses keywords when enabled
    pub fn new(crawler: SiteCrawler, input: InputConfig, enrichment: EnrichmentConfig) -> Self {
        let selector: Option<Arc<dyn ContactSelector>> = if enrichment.select_best_email {
            Some(Arc::new(KeywordContactSelector))
        } else {
            None
        };

        Self {
            crawler,
            input,
            enrichment,
            selector,
        }
    }

    /// Enables best-email selection with a custom selector
    pub fn with_selector(mut self, selector: Arc<dyn ContactSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn mode(&self) -> CrawlMode {
        self.enrichment.mode
    }

    pub async fn enrich(&self, row: InputRow) -> EnrichedRow {
        let hint_emails = self
            .input
            .email_hint_column
            .as_deref()
            .and_then(|column| row.get(column))
            .map(extract_emails)
            .unwrap_or_default();

        let (mut result, crawl_skipped) =
            if self.enrichment.skip_crawl_when_hint_has_email && !hint_emails.is_empty() {
                tracing::debug!(
                    "Row {}: hint column already has {} emails, skipping crawl",
                    row.index,
                    hint_emails.len()
                );
                (CrawlResult::empty(row.index), true)
            } else {
                (self.crawl_row(&row).await, false)
            };

        result.emails.extend(hint_emails);

        let best_email = match &self.selector {
            Some(selector) => self.select_best(selector.as_ref(), &row, &result).await,
            None => None,
        };

        EnrichedRow {
            row,
            result,
            best_email,
            crawl_skipped,
        }
    }

    async fn crawl_row(&self, row: &InputRow) -> CrawlResult {
        let Some(website) = row.get(&self.input.website_column) else {
            tracing::debug!("Row {}: no website", row.index);
            return CrawlResult::failed(row.index, "missing website");
        };

        match CrawlTarget::new(row.index, website) {
            Ok(target) => self.crawler.crawl_with_mode(&target, self.enrichment.mode).await,
            Err(e) => {
                tracing::warn!("Row {}: invalid website '{}': {}", row.index, website, e);
                CrawlResult::failed(row.index, format!("invalid website: {}", e))
            }
        }
    }

    async fn select_best(
        &self,
        selector: &dyn ContactSelector,
        row: &InputRow,
        result: &CrawlResult,
    ) -> Option<String> {
        if result.emails.is_empty() {
            return None;
        }

        let candidates: Vec<String> = result.emails.iter().cloned().collect();
        let context = ContactContext {
            name: self.column(row, self.input.name_column.as_deref()),
            address: self.column(row, self.input.address_column.as_deref()),
            url: row.get(&self.input.website_column).map(str::to_string),
        };

        match selector.select_best_contact(&candidates, &context).await {
            Ok(best) => best,
            Err(e) => {
                tracing::warn!(
                    "Row {}: contact selection failed, using keywords: {}",
                    row.index,
                    e
                );
                KeywordContactSelector
                    .select_best_contact(&candidates, &context)
                    .await
                    .ok()
                    .flatten()
            }
        }
    }

    fn column(&self, row: &InputRow, column: Option<&str>) -> Option<String> {
        column.and_then(|c| row.get(c)).map(str::to_string)
    }
}
