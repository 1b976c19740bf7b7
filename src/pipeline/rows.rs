use crate::Result;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// One input record, passed through to output untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    /// Zero-based position in the input file
    pub index: usize,

    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl InputRow {
    pub fn new(index: usize, headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self {
            index,
            headers,
            values,
        }
    }

    /// Returns the value of `column`, if the column exists and is non-empty
    pub fn get(&self, column: &str) -> Option<&str> {
        let position = self.headers.iter().position(|h| h == column)?;
        self.values
            .get(position)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Values aligned with the headers; missing trailing cells are empty
    pub fn values(&self) -> impl Iterator<Item = &str> {
        (0..self.headers.len()).map(|i| self.values.get(i).map(String::as_str).unwrap_or(""))
    }
}

/// A parsed input file
#[derive(Debug, Clone)]
pub struct InputTable {
    pub headers: Arc<Vec<String>>,
    pub rows: Vec<InputRow>,
}

/// Reads CSV rows from any reader
///
/// Ragged rows are accepted; short rows are padded with empty cells when
/// written back out.
pub fn read_rows<R: Read>(reader: R) -> Result<InputTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Arc<Vec<String>> = Arc::new(
        csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect(),
    );

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        rows.push(InputRow::new(
            index,
            Arc::clone(&headers),
            record.iter().map(str::to_string).collect(),
        ));
    }

    Ok(InputTable { headers, rows })
}

/// Reads CSV rows from a file
pub fn read_rows_from_path(path: &Path) -> Result<InputTable> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}
