//! Row-table readers.
//!
//! Release rows are read from parquet (nested info struct preserved), from
//! newline-delimited JSON (nested objects become structs, arrays become
//! lists) or from flat CSV.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// On-disk format of a row table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    Parquet,
    NdJson,
    Csv,
}

impl RowFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "parquet" | "pq" => Ok(Self::Parquet),
            "ndjson" | "jsonl" | "json" => Ok(Self::NdJson),
            "csv" => Ok(Self::Csv),
            _ => Err(IngestError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub(crate) fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Read a row table into a DataFrame.
pub fn read_rows(path: &Path) -> Result<DataFrame> {
    let format = RowFormat::from_path(path)?;
    let parse_err = |e: PolarsError| IngestError::RowParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let df = match format {
        RowFormat::Parquet => ParquetReader::new(open_file(path)?)
            .finish()
            .map_err(parse_err)?,
        RowFormat::NdJson => JsonReader::new(open_file(path)?)
            .with_json_format(JsonFormat::JsonLines)
            .finish()
            .map_err(parse_err)?,
        RowFormat::Csv => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(parse_err)?
            .finish()
            .map_err(parse_err)?,
    };

    if df.height() == 0 {
        return Err(IngestError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!(
        path = %path.display(),
        ?format,
        rows = df.height(),
        columns = df.width(),
        "read row table"
    );
    Ok(df)
}
