//! Dataset handle.
//!
//! A [`Dataset`] pairs a lazily evaluated row table with its dataset-wide
//! globals. Every operation returns a new handle or a materialized result;
//! nothing mutates the rows in place. Each materializing call (`aggregate`,
//! `count`, `collect`, ...) is one blocking pass over the rows.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use serde_json::Value;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::field::FieldCatalog;
use crate::globals::Globals;
use crate::values::cell_u64;

/// Conventional name of the struct column holding aggregate annotations.
pub const DEFAULT_INFO_ROOT: &str = "info";

const COUNT_ALIAS: &str = "__n";

#[derive(Clone)]
pub struct Dataset {
    rows: LazyFrame,
    globals: Globals,
    set_fields: BTreeSet<String>,
    info_root: String,
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("info_root", &self.info_root)
            .field("globals", &self.globals.names().collect::<Vec<_>>())
            .field("set_fields", &self.set_fields)
            .finish_non_exhaustive()
    }
}

impl Dataset {
    pub fn new(rows: LazyFrame) -> Self {
        Self {
            rows,
            globals: Globals::new(),
            set_fields: BTreeSet::new(),
            info_root: DEFAULT_INFO_ROOT.to_string(),
        }
    }

    pub fn from_frame(df: DataFrame) -> Self {
        Self::new(df.lazy())
    }

    #[must_use]
    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    /// Mark a list field (dotted path, e.g. `info.vep_flags`) as a set.
    #[must_use]
    pub fn with_set_field(mut self, path: impl Into<String>) -> Self {
        self.set_fields.insert(path.into());
        self
    }

    #[must_use]
    pub fn with_info_root(mut self, root: impl Into<String>) -> Self {
        self.info_root = root.into();
        self
    }

    /// Same metadata over a different row table.
    #[must_use]
    pub fn with_rows(&self, rows: LazyFrame) -> Self {
        Self {
            rows,
            globals: self.globals.clone(),
            set_fields: self.set_fields.clone(),
            info_root: self.info_root.clone(),
        }
    }

    pub fn lazy(&self) -> LazyFrame {
        self.rows.clone()
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn global(&self, name: &str) -> Result<&Value> {
        self.globals.get(name)
    }

    pub fn info_root(&self) -> &str {
        &self.info_root
    }

    pub fn is_set_field(&self, path: &str) -> bool {
        self.set_fields.contains(path)
    }

    pub fn set_fields(&self) -> impl Iterator<Item = &str> {
        self.set_fields.iter().map(String::as_str)
    }

    /// Row schema, resolved without reading any rows.
    pub fn schema(&self) -> Result<SchemaRef> {
        let mut rows = self.rows.clone();
        Ok(rows.collect_schema()?)
    }

    /// Field catalog of this snapshot, for eager name validation.
    pub fn catalog(&self) -> Result<FieldCatalog> {
        Ok(FieldCatalog::from_schema(self.schema()?.as_ref(), &self.info_root))
    }

    pub fn row_fields(&self) -> Result<Vec<String>> {
        Ok(self.catalog()?.row_names().map(str::to_string).collect())
    }

    pub fn info_fields(&self) -> Result<Vec<String>> {
        Ok(self.catalog()?.info_names().map(str::to_string).collect())
    }

    pub fn has_row_field(&self, name: &str) -> Result<bool> {
        Ok(self.catalog()?.has_row(name))
    }

    pub fn has_info_field(&self, name: &str) -> Result<bool> {
        Ok(self.catalog()?.has_info(name))
    }

    #[must_use]
    pub fn filter(&self, predicate: Expr) -> Self {
        self.with_rows(self.rows.clone().filter(predicate))
    }

    /// Add or replace row columns.
    #[must_use]
    pub fn annotate(&self, exprs: Vec<Expr>) -> Self {
        self.with_rows(self.rows.clone().with_columns(exprs))
    }

    #[must_use]
    pub fn select(&self, exprs: Vec<Expr>) -> Self {
        self.with_rows(self.rows.clone().select(exprs))
    }

    #[must_use]
    pub fn head(&self, n: usize) -> Self {
        let n = IdxSize::try_from(n).unwrap_or(IdxSize::MAX);
        self.with_rows(self.rows.clone().limit(n))
    }

    /// Evaluate aggregate expressions over all rows in one pass.
    ///
    /// The result has exactly one row.
    pub fn aggregate(&self, aggs: Vec<Expr>) -> Result<DataFrame> {
        debug!(n_exprs = aggs.len(), "aggregating dataset");
        Ok(self.rows.clone().select(aggs).collect()?)
    }

    /// Group rows by `keys` and evaluate `aggs` per group.
    pub fn group_by_aggregate(&self, keys: Vec<Expr>, aggs: Vec<Expr>) -> Result<DataFrame> {
        Ok(self.rows.clone().group_by(keys).agg(aggs).collect()?)
    }

    pub fn count(&self) -> Result<usize> {
        let df = self
            .rows
            .clone()
            .select([len().alias(COUNT_ALIAS)])
            .collect()?;
        let n = cell_u64(&df, COUNT_ALIAS, 0)?;
        Ok(usize::try_from(n).unwrap_or(usize::MAX))
    }

    pub fn collect(&self) -> Result<DataFrame> {
        Ok(self.rows.clone().collect()?)
    }

    /// One output row per element of the list column `field`.
    ///
    /// Empty and missing lists produce a single row with a missing element.
    pub fn explode(&self, field: &str) -> Result<Self> {
        let df = self.collect()?.explode([field])?;
        Ok(self.with_rows(df.lazy()))
    }

    /// Materialize the rows in memory so later passes reuse the result
    /// instead of re-evaluating the lazy plan.
    pub fn persist(&self) -> Result<Self> {
        let df = self.collect()?;
        debug!(rows = df.height(), "persisted dataset");
        Ok(self.with_rows(df.lazy()))
    }

    /// Write the rows to a parquet file and continue from the written copy.
    pub fn checkpoint(&self, path: &Path) -> Result<Self> {
        let mut df = self.collect()?;
        let file = File::create(path).map_err(|source| ModelError::Checkpoint {
            path: path.to_path_buf(),
            source,
        })?;
        ParquetWriter::new(file).finish(&mut df)?;
        let file = File::open(path).map_err(|source| ModelError::Checkpoint {
            path: path.to_path_buf(),
            source,
        })?;
        let reread = ParquetReader::new(file).finish()?;
        debug!(path = %path.display(), rows = reread.height(), "checkpointed dataset");
        Ok(self.with_rows(reread.lazy()))
    }
}
