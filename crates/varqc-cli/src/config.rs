//! Validation options from a TOML file plus command-line overrides.
//!
//! Every option has a default, so a configuration file only lists what it
//! changes:
//!
//! ```toml
//! delimiter = "_"
//! metric_first_field = false
//! pops = ["afr", "amr", "nfe"]
//! expected_contigs = ["chr1", "chr2", "chrX", "chrY"]
//!
//! [stages]
//! pprint_globals = true
//!
//! [row_to_globals_check]
//! freq = ["freq_meta", "freq_meta_sample_count"]
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use varqc_model::ValidationOptions;
use varqc_validate::Stage;

/// Command-line settings layered over the file.
#[derive(Debug, Clone, Default)]
pub struct OptionOverrides {
    pub skip: Vec<Stage>,
    pub verbose_checks: bool,
    pub missingness_threshold: Option<f64>,
    pub expected_contigs: Vec<String>,
    pub array_struct_missingness: bool,
}

/// Parse validation options from TOML text.
pub fn parse_options(text: &str) -> Result<ValidationOptions> {
    toml::from_str(text).context("parse validation options")
}

/// Load validation options from `path`, or the defaults when absent.
pub fn load_options(path: Option<&Path>) -> Result<ValidationOptions> {
    let Some(path) = path else {
        return Ok(ValidationOptions::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse_options(&text).with_context(|| format!("load config {}", path.display()))
}

/// Apply command-line overrides. Flags only ever switch things on, skip
/// stages, or replace a value; they never reset a file setting to default.
pub fn apply_overrides(mut options: ValidationOptions, overrides: &OptionOverrides) -> ValidationOptions {
    for stage in &overrides.skip {
        stage.disable(&mut options);
    }
    if overrides.verbose_checks {
        options.verbose = true;
    }
    if let Some(threshold) = overrides.missingness_threshold {
        options.missingness_threshold = threshold;
    }
    if !overrides.expected_contigs.is_empty() {
        options.expected_contigs = Some(overrides.expected_contigs.clone());
    }
    if overrides.array_struct_missingness {
        options.stages.array_struct_missingness = true;
    }
    options
}
