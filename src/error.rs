use std::path::PathBuf;

use thiserror::Error;

/// A file that was skipped during ingestion, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileFailure {
    pub file: String,
    pub cause: String,
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("No uploaded file could be parsed ({} failed); nothing to summarize", .failures.len())]
    NoValidUploads { failures: Vec<FileFailure> },
    #[error("Reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode text with encoding {encoding}")]
    Decode { encoding: &'static str },
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("File has no header row")]
    EmptyHeader,
    #[error("Row {row} has {found} field(s) but the header declares {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Invalid alias configuration: {0}")]
    Config(String),
}

pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;
