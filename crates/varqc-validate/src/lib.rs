//! Validity checks for variant release datasets.
//!
//! A check pairs a description of the expected condition with a predicate
//! that is true on violating rows. Checks are grouped into families and
//! every family is evaluated with one aggregation over the rows. Results go
//! to a [`ReportSink`] as report lines and example-row tables, and come back
//! as [`CheckOutcome`]s.
//!
//! # Example
//!
//! ```ignore
//! use varqc_model::ValidationOptions;
//! use varqc_validate::{MemorySink, validate_release};
//!
//! let mut sink = MemorySink::new();
//! let summary = validate_release(&dataset, &ValidationOptions::default(), &mut sink)?;
//! assert_eq!(summary.n_failed(), 0);
//! ```

mod check;
pub mod checks;
mod display;
mod error;
mod executor;
pub mod expr;
pub mod intervals;
pub mod missingness;
mod orchestrator;
mod reporter;
mod sink;

// === Error Types ===
pub use error::{Result, ValidateError};

// === Check Registry ===
pub use check::{DisplayField, FieldCheck, FieldCheckRegistry};

// === Execution & Reporting ===
pub use executor::{count_failures, generic_field_check_loop};
pub use reporter::{
    CheckOutcome, CheckStatus, FieldCheckInput, ReportSettings, generic_field_check,
};

// === Report Output ===
pub use display::DisplayTable;
pub use sink::{MemorySink, REPORT_TARGET, ReportEvent, ReportLevel, ReportSink, TracingSink};

// === Missingness ===
pub use missingness::{
    FieldShape, MissingnessOutcome, MissingnessReport, MissingnessTree,
    check_array_struct_missingness, check_missingness_of_struct, compute_missingness,
    flatten_missingness_struct, unfurl_array_annotations,
};

// === Intervals ===
pub use intervals::{IntervalCounts, IntervalIndex, count_vep_annotated_variants_per_interval};

// === Orchestration ===
pub use orchestrator::{Stage, StageReport, ValidationSummary, validate_release};
