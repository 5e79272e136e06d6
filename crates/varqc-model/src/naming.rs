//! Stratified field-name assembly.
//!
//! Release fields are named `{metric}{d}{subset}{d}{labels}` (metric first)
//! or `{subset}{d}{metric}{d}{labels}` (subset first). An empty subset
//! contributes neither its name nor a delimiter.

use serde::{Deserialize, Serialize};

/// How stratified field names are assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNaming {
    pub delimiter: String,
    pub metric_first: bool,
}

impl Default for FieldNaming {
    fn default() -> Self {
        Self {
            delimiter: "-".to_string(),
            metric_first: true,
        }
    }
}

impl FieldNaming {
    pub fn new(delimiter: impl Into<String>, metric_first: bool) -> Self {
        Self {
            delimiter: delimiter.into(),
            metric_first,
        }
    }

    /// Prefix shared by every stratified field of `metric` in `subset`.
    ///
    /// Always ends in the delimiter so a label combination can be appended.
    pub fn prefix(&self, metric: &str, subset: &str) -> String {
        let d = &self.delimiter;
        match (subset.is_empty(), self.metric_first) {
            (true, _) => format!("{metric}{d}"),
            (false, true) => format!("{metric}{d}{subset}{d}"),
            (false, false) => format!("{subset}{d}{metric}{d}"),
        }
    }

    /// Full field name for `metric` stratified by `label` within `subset`.
    pub fn field(&self, metric: &str, subset: &str, label: &str) -> String {
        format!("{}{label}", self.prefix(metric, subset))
    }

    /// Join label values with the delimiter.
    pub fn join<S: AsRef<str>>(&self, parts: &[S]) -> String {
        parts
            .iter()
            .map(AsRef::as_ref)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }
}
