//! Error types for dataset ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a release dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension does not name a supported row format.
    #[error("unsupported row format for {path}: expected .parquet, .ndjson, .jsonl or .csv")]
    UnsupportedFormat { path: PathBuf },

    // === Parsing Errors ===
    /// Polars failed to parse the row file.
    #[error("failed to parse {path}: {message}")]
    RowParse { path: PathBuf, message: String },

    /// Row file contains no rows.
    #[error("dataset is empty: {path}")]
    EmptyDataset { path: PathBuf },

    /// A JSON sidecar could not be parsed.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON sidecar has the wrong shape.
    #[error("unexpected content in {path}: {reason}")]
    SidecarFormat { path: PathBuf, reason: String },

    // === DataFrame Errors ===
    /// Required key column is absent.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/data/release.parquet"),
        };
        assert_eq!(err.to_string(), "file not found: /data/release.parquet");
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("contig".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
