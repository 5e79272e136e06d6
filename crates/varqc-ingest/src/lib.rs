//! Release dataset ingestion.
//!
//! Loads a row table (parquet, newline-delimited JSON or CSV) into a
//! [`varqc_model::Dataset`], attaching globals from a JSON sidecar.
//!
//! # Example
//!
//! ```ignore
//! use varqc_ingest::{DatasetSource, load_dataset};
//!
//! let source = DatasetSource::new("release.parquet").with_globals("globals.json");
//! let dataset = load_dataset(&source)?;
//! ```

mod error;
mod loader;
mod reader;
mod sidecar;

// === Error Types ===
pub use error::{IngestError, Result};

// === Row Reading ===
pub use reader::{RowFormat, read_rows};

// === Sidecars ===
pub use sidecar::{read_globals, read_header_dict};

// === Dataset Loading ===
pub use loader::{DatasetSource, load_dataset};
