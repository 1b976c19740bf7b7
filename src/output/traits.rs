//! Output sink trait and run summary types
//!
//! This module defines the trait interface for result sinks and the
//! statistics gathered while results are written.

use crate::config::CrawlMode;
use crate::pipeline::EnrichedRow;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination of enriched rows
///
/// A sink is owned and driven by exactly one writer, so implementations need
/// no internal locking. Any error is treated as fatal for the run.
pub trait ResultSink: Send {
    /// Appends one row
    ///
    /// # Arguments
    ///
    /// * `row` - The enriched row, in completion order
    fn write(&mut self, row: &EnrichedRow) -> OutputResult<()>;

    /// Flushes and closes the sink after the last row
    fn finish(&mut self) -> OutputResult<()>;
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    // Run metadata
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub config_hash: String,
    pub mode: Option<CrawlMode>,
    pub concurrency: usize,

    // Row statistics
    pub rows_total: usize,
    pub rows_written: usize,
    pub rows_with_emails: usize,
    pub rows_failed: usize,
    pub rows_crawl_skipped: usize,
    pub rows_with_best_email: usize,

    // Crawl statistics
    pub emails_found: usize,
    pub pages_visited: usize,
    pub pages_failed: usize,
    pub team_pages_found: usize,

    // Most frequent target-level errors (message, count), most frequent first
    pub top_errors: Vec<(String, usize)>,
}

impl RunSummary {
    /// Creates a new empty run summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one written row into the statistics
    pub fn record(&mut self, row: &EnrichedRow) {
        let result = &row.result;

        self.rows_written += 1;
        self.emails_found += result.emails.len();
        self.pages_visited += result.pages_visited;
        self.pages_failed += result.pages_failed;
        self.team_pages_found += result.team_pages.len();

        if !result.emails.is_empty() {
            self.rows_with_emails += 1;
        }
        if row.crawl_skipped {
            self.rows_crawl_skipped += 1;
        }
        if row.best_email.is_some() {
            self.rows_with_best_email += 1;
        }
        if let Some(error) = &result.error {
            self.rows_failed += 1;
            match self.top_errors.iter_mut().find(|(msg, _)| msg == error) {
                Some((_, count)) => *count += 1,
                None => self.top_errors.push((error.clone(), 1)),
            }
        }
    }

    /// Percentage of written rows with at least one email
    pub fn email_hit_rate(&self) -> f64 {
        if self.rows_written == 0 {
            return 0.0;
        }
        (self.rows_with_emails as f64 / self.rows_written as f64) * 100.0
    }

    /// Percentage of fetch attempts that failed
    pub fn page_error_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.pages_failed as f64 / self.pages_visited as f64) * 100.0
    }

    /// Errors sorted by frequency, at most `limit` entries
    pub fn most_common_errors(&self, limit: usize) -> Vec<(String, usize)> {
        let mut errors = self.top_errors.clone();
        errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        errors.truncate(limit);
        errors
    }
}
