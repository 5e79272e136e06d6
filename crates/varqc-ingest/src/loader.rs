//! Assemble a [`Dataset`] from a row file and optional sidecars.

use std::path::PathBuf;

use varqc_model::{CONTIG_COLUMN, DEFAULT_INFO_ROOT, Dataset, Globals, POSITION_COLUMN};

use crate::error::Result;
use crate::reader::read_rows;
use crate::sidecar::read_globals;

/// Where a release dataset lives on disk.
#[derive(Debug, Clone)]
pub struct DatasetSource {
    pub rows: PathBuf,
    pub globals: Option<PathBuf>,
    /// Dotted paths of list fields with set semantics.
    pub set_fields: Vec<String>,
    pub info_root: String,
}

impl DatasetSource {
    pub fn new(rows: impl Into<PathBuf>) -> Self {
        Self {
            rows: rows.into(),
            globals: None,
            set_fields: Vec::new(),
            info_root: DEFAULT_INFO_ROOT.to_string(),
        }
    }

    #[must_use]
    pub fn with_globals(mut self, path: impl Into<PathBuf>) -> Self {
        self.globals = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_set_fields(mut self, paths: Vec<String>) -> Self {
        self.set_fields = paths;
        self
    }
}

/// Load rows and globals into an in-memory dataset handle.
pub fn load_dataset(source: &DatasetSource) -> Result<Dataset> {
    let df = read_rows(&source.rows)?;

    for key in [CONTIG_COLUMN, POSITION_COLUMN] {
        if df.column(key).is_err() {
            tracing::warn!(
                path = %source.rows.display(),
                column = key,
                "locus column absent; locus-aware checks will fail"
            );
        }
    }

    let globals = match &source.globals {
        Some(path) => read_globals(path)?,
        None => Globals::new(),
    };

    let mut dataset = Dataset::from_frame(df)
        .with_globals(globals)
        .with_info_root(source.info_root.clone());
    for path in &source.set_fields {
        dataset = dataset.with_set_field(path.clone());
    }

    tracing::info!(
        path = %source.rows.display(),
        globals = source.globals.is_some(),
        "loaded dataset"
    );
    Ok(dataset)
}
