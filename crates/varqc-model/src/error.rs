//! Error types for the dataset model.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while building or querying a dataset handle.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A label group axis has no position in the canonical sort order.
    #[error("label group '{axis}' is not present in the sort order")]
    UnknownAxis { axis: String },

    /// A constructed field name does not resolve against the dataset schema.
    #[error("field '{field}' not found in {scope}")]
    FieldNotFound { field: String, scope: String },

    /// A global annotation is absent from the dataset metadata.
    #[error("global annotation '{name}' not found")]
    GlobalNotFound { name: String },

    /// A global annotation cannot be read as a label -> position dictionary.
    #[error("global annotation '{name}' is not an index dictionary: {reason}")]
    InvalidIndexDict { name: String, reason: String },

    /// A global annotation was expected to be an array or object.
    #[error("global annotation '{name}' is not an array or object")]
    GlobalNotArray { name: String },

    /// A column has a type the operation cannot handle.
    #[error("column '{column}' has type {dtype}, expected {expected}")]
    UnexpectedType {
        column: String,
        dtype: String,
        expected: String,
    },

    /// An option value is outside its accepted range.
    #[error("invalid option {option}: {reason}")]
    InvalidOption { option: String, reason: String },

    /// Writing or reading a checkpoint failed.
    #[error("checkpoint {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tabular engine reported an error.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
