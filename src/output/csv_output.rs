use crate::config::OutputConfig;
use crate::output::traits::{OutputResult, ResultSink};
use crate::pipeline::EnrichedRow;
use crate::select::NO_CONTACT;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column carrying the input row number
pub const ROW_INDEX_COLUMN: &str = "row_index";

/// Column carrying the number of fetch attempts
pub const PAGES_VISITED_COLUMN: &str = "PagesVisited";

/// Column carrying a target-level error, if any
pub const CRAWL_ERROR_COLUMN: &str = "CrawlError";

/// Writes enriched rows as CSV
///
/// The header is the input columns, then `row_index`, the emails column, the
/// best-email column (when enabled), the pages visited and crawl error
/// columns, then `TeamPage_1..N` (when configured). It goes out with the
/// first row, or on `finish` when there were no rows. Every row is flushed as
/// soon as it is written, so a crashed run still leaves every completed row
/// on disk.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    input_headers: Vec<String>,
    config: OutputConfig,
    include_best_email: bool,
    team_page_columns: usize,
    header_written: bool,
}

impl CsvSink<File> {
    /// Creates a sink writing to a new file at `path`
    pub fn create(
        path: &Path,
        input_headers: &[String],
        config: OutputConfig,
        include_best_email: bool,
        include_team_pages: bool,
    ) -> OutputResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(
            file,
            input_headers,
            config,
            include_best_email,
            include_team_pages,
        ))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(
        inner: W,
        input_headers: &[String],
        config: OutputConfig,
        include_best_email: bool,
        include_team_pages: bool,
    ) -> Self {
        let team_page_columns = if include_team_pages {
            config.team_page_columns
        } else {
            0
        };

        Self {
            writer: csv::Writer::from_writer(inner),
            input_headers: input_headers.to_vec(),
            config,
            include_best_email,
            team_page_columns,
            header_written: false,
        }
    }

    /// Consumes the sink and returns the underlying writer
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::output::OutputError::Write(e.to_string()))
    }

    fn write_header(&mut self) -> OutputResult<()> {
        let mut header = self.input_headers.clone();
        header.push(ROW_INDEX_COLUMN.to_string());
        header.push(self.config.emails_column.clone());
        if self.include_best_email {
            header.push(self.config.best_email_column.clone());
        }
        header.push(PAGES_VISITED_COLUMN.to_string());
        header.push(CRAWL_ERROR_COLUMN.to_string());
        for i in 1..=self.team_page_columns {
            header.push(format!("TeamPage_{}", i));
        }

        self.writer.write_record(&header)?;
        self.header_written = true;
        Ok(())
    }
}

impl<W: Write + Send> ResultSink for CsvSink<W> {
    fn write(&mut self, row: &EnrichedRow) -> OutputResult<()> {
        if !self.header_written {
            self.write_header()?;
        }

        let result = &row.result;
        let mut record: Vec<String> = row.row.values().map(str::to_string).collect();
        record.push(row.row.index.to_string());
        record.push(result.emails_joined());
        if self.include_best_email {
            record.push(
                row.best_email
                    .clone()
                    .unwrap_or_else(|| NO_CONTACT.to_string()),
            );
        }
        record.push(result.pages_visited.to_string());
        record.push(result.error.clone().unwrap_or_default());
        for i in 0..self.team_page_columns {
            record.push(result.team_pages.get(i).cloned().unwrap_or_default());
        }

        self.writer.write_record(&record)?;
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if !self.header_written {
            self.write_header()?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
