//! Typed field addressing.
//!
//! Check builders assemble field names at runtime from metrics and label
//! combinations. Instead of resolving those names implicitly, every name is
//! looked up once against a [`FieldCatalog`] built from the dataset schema;
//! a name that does not resolve is reported immediately.

use std::fmt;

use polars::prelude::*;

use crate::error::{ModelError, Result};

/// A resolved reference to a row-level or info-level field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    /// Top-level row column.
    Row(String),
    /// Field nested inside the info struct column `root`.
    Info { root: String, name: String },
}

impl FieldRef {
    /// Leaf name, used as the column alias when the field is displayed.
    pub fn name(&self) -> &str {
        match self {
            Self::Row(name) | Self::Info { name, .. } => name,
        }
    }

    /// Dotted path, e.g. `info.AC-adj`.
    pub fn path(&self) -> String {
        match self {
            Self::Row(name) => name.clone(),
            Self::Info { root, name } => format!("{root}.{name}"),
        }
    }

    /// Expression reading the field from each row.
    pub fn expr(&self) -> Expr {
        match self {
            Self::Row(name) => col(name.as_str()),
            Self::Info { root, name } => col(root.as_str()).struct_().field_by_name(name),
        }
    }

    pub fn is_info(&self) -> bool {
        matches!(self, Self::Info { .. })
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Field names and types available in one dataset snapshot.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    info_root: String,
    row: Vec<(String, DataType)>,
    info: Vec<(String, DataType)>,
}

impl FieldCatalog {
    /// Build a catalog from a row schema. The info fields are the members of
    /// the struct column `info_root`, if present.
    pub fn from_schema(schema: &Schema, info_root: &str) -> Self {
        let mut row = Vec::with_capacity(schema.len());
        let mut info = Vec::new();
        for (name, dtype) in schema.iter() {
            if name.as_str() == info_root
                && let DataType::Struct(fields) = dtype
            {
                info = fields
                    .iter()
                    .map(|field| (field.name().to_string(), field.dtype().clone()))
                    .collect();
            }
            row.push((name.to_string(), dtype.clone()));
        }
        Self {
            info_root: info_root.to_string(),
            row,
            info,
        }
    }

    pub fn info_root(&self) -> &str {
        &self.info_root
    }

    pub fn has_info(&self, name: &str) -> bool {
        self.info.iter().any(|(candidate, _)| candidate == name)
    }

    pub fn has_row(&self, name: &str) -> bool {
        self.row.iter().any(|(candidate, _)| candidate == name)
    }

    /// Resolve an info field, failing if it is absent.
    pub fn info(&self, name: &str) -> Result<FieldRef> {
        if self.has_info(name) {
            Ok(self.info_ref(name))
        } else {
            Err(ModelError::FieldNotFound {
                field: name.to_string(),
                scope: self.info_root.clone(),
            })
        }
    }

    /// Resolve an info field, or `None` if it is absent.
    pub fn try_info(&self, name: &str) -> Option<FieldRef> {
        self.has_info(name).then(|| self.info_ref(name))
    }

    /// Resolve a top-level row field, failing if it is absent.
    pub fn row(&self, name: &str) -> Result<FieldRef> {
        if self.has_row(name) {
            Ok(FieldRef::Row(name.to_string()))
        } else {
            Err(ModelError::FieldNotFound {
                field: name.to_string(),
                scope: "row fields".to_string(),
            })
        }
    }

    pub fn info_names(&self) -> impl Iterator<Item = &str> {
        self.info.iter().map(|(name, _)| name.as_str())
    }

    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.row.iter().map(|(name, _)| name.as_str())
    }

    pub fn info_dtype(&self, name: &str) -> Option<&DataType> {
        self.info
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, dtype)| dtype)
    }

    pub fn row_dtype(&self, name: &str) -> Option<&DataType> {
        self.row
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, dtype)| dtype)
    }

    fn info_ref(&self, name: &str) -> FieldRef {
        FieldRef::Info {
            root: self.info_root.clone(),
            name: name.to_string(),
        }
    }
}
