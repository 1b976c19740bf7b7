//! Output module for writing enriched rows and run reports
//!
//! This module handles:
//! - The `ResultSink` interface driven by the single writer
//! - CSV output of enriched rows
//! - End-of-run statistics and markdown summaries

mod csv_output;
mod markdown;
pub mod stats;
mod traits;

pub use csv_output::{CsvSink, CRAWL_ERROR_COLUMN, PAGES_VISITED_COLUMN, ROW_INDEX_COLUMN};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::print_statistics;
pub use traits::{OutputError, OutputResult, ResultSink, RunSummary};
