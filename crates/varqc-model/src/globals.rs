//! Dataset-wide metadata ("globals").
//!
//! Globals are an ordered JSON object attached to a dataset. The checks read
//! two kinds of values out of it: index dictionaries mapping a category
//! label to an array position, and arrays whose length must agree with
//! per-row array annotations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ModelError, Result};

/// Dataset-wide metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Globals(Map<String, Value>);

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build globals from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ModelError::InvalidOption {
                option: "globals".to_string(),
                reason: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
        }
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a global annotation.
    pub fn get(&self, name: &str) -> Result<&Value> {
        self.0.get(name).ok_or_else(|| ModelError::GlobalNotFound {
            name: name.to_string(),
        })
    }

    /// Length of a global array annotation. An object counts its keys.
    pub fn array_len(&self, name: &str) -> Result<usize> {
        match self.get(name)? {
            Value::Array(items) => Ok(items.len()),
            Value::Object(map) => Ok(map.len()),
            _ => Err(ModelError::GlobalNotArray {
                name: name.to_string(),
            }),
        }
    }

    /// Read a global annotation as a label -> array position dictionary.
    pub fn index_dict(&self, name: &str) -> Result<IndexDict> {
        let Value::Object(map) = self.get(name)? else {
            return Err(ModelError::InvalidIndexDict {
                name: name.to_string(),
                reason: "expected a JSON object".to_string(),
            });
        };
        let mut entries = Vec::with_capacity(map.len());
        for (label, position) in map {
            let index = position
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| ModelError::InvalidIndexDict {
                    name: name.to_string(),
                    reason: format!("position for '{label}' is not a non-negative integer"),
                })?;
            entries.push((label.clone(), index));
        }
        Ok(IndexDict(entries))
    }

    /// Pretty-printed JSON rendering of every global, in insertion order.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Category label -> array position mapping read from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDict(Vec<(String, usize)>);

impl IndexDict {
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(label, index)| (label.as_str(), *index))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, index)| *index)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
