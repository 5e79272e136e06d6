//! Error types for validity checks.
//!
//! These cover misconfigured checks only. Rows that fail a check are
//! reported as [`crate::CheckOutcome`]s, never as errors.

use polars::prelude::PolarsError;
use thiserror::Error;
use varqc_model::ModelError;

#[derive(Debug, Error)]
pub enum ValidateError {
    /// The reporter was given neither a failure count nor a predicate.
    #[error("check '{description}' needs a failure count or a failure predicate")]
    MissingCheckInput { description: String },

    /// A constructed field name does not resolve against the dataset.
    #[error("field '{field}' not found in {scope}")]
    FieldNotFound { field: String, scope: String },

    /// A global annotation is absent.
    #[error("global annotation '{name}' not found")]
    GlobalNotFound { name: String },

    /// A global annotation cannot be used as an index dictionary.
    #[error("global annotation '{name}' is not an index dictionary: {reason}")]
    InvalidIndexDict { name: String, reason: String },

    /// A field has a type the check cannot handle.
    #[error("field '{field}' has type {dtype}, expected {expected}")]
    UnexpectedType {
        field: String,
        dtype: String,
        expected: String,
    },

    /// Label groups passed to a check builder are unusable.
    #[error("invalid label groups: {reason}")]
    InvalidLabelGroups { reason: String },

    #[error(transparent)]
    Model(ModelError),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl From<ModelError> for ValidateError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::FieldNotFound { field, scope } => Self::FieldNotFound { field, scope },
            ModelError::GlobalNotFound { name } => Self::GlobalNotFound { name },
            ModelError::InvalidIndexDict { name, reason } => Self::InvalidIndexDict { name, reason },
            ModelError::Polars(err) => Self::Polars(err),
            other => Self::Model(other),
        }
    }
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_are_lifted() {
        let err: ValidateError = ModelError::GlobalNotFound {
            name: "freq_index_dict".to_string(),
        }
        .into();
        assert!(matches!(err, ValidateError::GlobalNotFound { name } if name == "freq_index_dict"));
    }

    #[test]
    fn test_missing_input_display() {
        let err = ValidateError::MissingCheckInput {
            description: "AC-raw > 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "check 'AC-raw > 0' needs a failure count or a failure predicate"
        );
    }
}
