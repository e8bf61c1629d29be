use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use csv::ReaderBuilder;
use thiserror::Error;
use tracing::info;

use crate::filters::NumericFilter;

/// Default name of the column holding ticker symbols
pub const DEFAULT_TICKER_COLUMN: &str = "Ticker";

/// Extensions accepted for uploaded ticker lists
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

#[derive(Error, Debug)]
pub enum TickerFileError {
    #[error("file '{}' was not found", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file type '{0}': only .csv and .txt files are accepted")]
    UnsupportedFileType(String),

    #[error("column '{column}' not found; available columns are: {available}")]
    MissingColumn { column: String, available: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Reject uploads that are not `.csv` or `.txt`, case-insensitively
pub fn validate_upload(file_name: &str) -> Result<(), TickerFileError> {
    let accepted = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)));

    if accepted { Ok(()) } else { Err(TickerFileError::UnsupportedFileType(file_name.to_string())) }
}

/// Unique ticker values of `column`, in order of first appearance
///
/// Values are trimmed and blanks dropped; case is preserved. A file with no
/// header or no rows yields an empty list.
pub fn unique_tickers_from_csv<P: AsRef<Path>>(path: P, column: &str) -> Result<Vec<String>, TickerFileError> {
    unique_tickers_filtered(path, column, &[])
}

/// Like `unique_tickers_from_csv`, keeping only rows that pass every filter
pub fn unique_tickers_filtered<P: AsRef<Path>>(path: P, column: &str, filters: &[NumericFilter]) -> Result<Vec<String>, TickerFileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => TickerFileError::NotFound(path.to_path_buf()),
        _ => TickerFileError::Io(err),
    })?;

    let tickers = unique_tickers_from_reader(file, column, filters)?;
    info!("Loaded {} unique tickers from {}", tickers.len(), path.display());

    Ok(tickers)
}

/// Core of the CSV ticker extraction over any reader
pub fn unique_tickers_from_reader<R: Read>(reader: R, column: &str, filters: &[NumericFilter]) -> Result<Vec<String>, TickerFileError> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let position = |name: &str| {
        headers.iter().position(|header| header == name).ok_or_else(|| TickerFileError::MissingColumn {
            column: name.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })
    };

    let ticker_idx = position(column)?;
    let filter_idx = filters.iter().map(|filter| position(&filter.column).map(|idx| (idx, filter))).collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();

    for record in reader.records() {
        let record = record?;

        if !filter_idx.iter().all(|(idx, filter)| filter.accepts_cell(record.get(*idx))) {
            continue;
        }

        let Some(ticker) = record.get(ticker_idx).map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };

        if seen.insert(ticker.to_string()) {
            tickers.push(ticker.to_string());
        }
    }

    Ok(tickers)
}
