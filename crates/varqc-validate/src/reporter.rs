//! Pass/fail reporting for a single check.

use polars::prelude::*;
use serde::Serialize;
use varqc_model::{Dataset, DisplayLimits, ValidationOptions};

use crate::check::DisplayField;
use crate::display::DisplayTable;
use crate::error::{Result, ValidateError};
use crate::sink::ReportSink;

/// Presentation settings shared by every check in a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportSettings {
    /// Show example rows for passing checks too.
    pub verbose: bool,
    pub show_percent_sites: bool,
    pub limits: DisplayLimits,
}

impl ReportSettings {
    pub fn from_options(options: &ValidationOptions) -> Self {
        Self {
            verbose: options.verbose,
            show_percent_sites: options.show_percent_sites,
            limits: options.display,
        }
    }

    #[must_use]
    pub fn with_percent(mut self, show_percent_sites: bool) -> Self {
        self.show_percent_sites = show_percent_sites;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Passed,
    Failed,
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    pub description: String,
    pub n_fail: u64,
    pub n_total: Option<usize>,
    pub status: CheckStatus,
}

impl CheckOutcome {
    pub fn new(description: impl Into<String>, n_fail: u64, failed: bool) -> Self {
        Self {
            description: description.into(),
            n_fail,
            n_total: None,
            status: if failed {
                CheckStatus::Failed
            } else {
                CheckStatus::Passed
            },
        }
    }

    /// Outcome of a count-based check: any failing row fails it.
    pub fn from_count(description: impl Into<String>, n_fail: u64) -> Self {
        Self::new(description, n_fail, n_fail > 0)
    }

    #[must_use]
    pub fn with_total(mut self, n_total: Option<usize>) -> Self {
        self.n_total = n_total;
        self
    }

    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }

    /// Failing fraction of rows, when the total is known and non-zero.
    pub fn fail_fraction(&self) -> Option<f64> {
        match self.n_total {
            Some(total) if total > 0 => Some(self.n_fail as f64 / total as f64),
            _ => None,
        }
    }
}

/// Inputs to [`generic_field_check`].
#[derive(Debug, Clone, Copy)]
pub struct FieldCheckInput<'a> {
    pub description: &'a str,
    /// True on failing rows.
    pub predicate: Option<&'a Expr>,
    /// Failure count computed earlier, e.g. by the batched executor.
    pub n_fail: Option<u64>,
    pub display: &'a [DisplayField],
    /// Row count computed earlier, used for the failing percentage.
    pub n_total: Option<usize>,
}

impl<'a> FieldCheckInput<'a> {
    pub fn new(description: &'a str, display: &'a [DisplayField]) -> Self {
        Self {
            description,
            predicate: None,
            n_fail: None,
            display,
            n_total: None,
        }
    }

    #[must_use]
    pub fn predicate(mut self, predicate: &'a Expr) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn n_fail(mut self, n_fail: u64) -> Self {
        self.n_fail = Some(n_fail);
        self
    }

    #[must_use]
    pub fn n_total(mut self, n_total: Option<usize>) -> Self {
        self.n_total = n_total;
        self
    }
}

/// Report whether `ds` passes one check.
///
/// The failure count is taken from `input.n_fail` when present; otherwise
/// the predicate is evaluated with a full pass over the rows. When failing
/// rows exist and a predicate is known, up to `n_rows` of them are shown
/// with the display fields. Passing checks show rows only when verbose.
pub fn generic_field_check(
    ds: &Dataset,
    input: FieldCheckInput<'_>,
    settings: &ReportSettings,
    sink: &mut dyn ReportSink,
) -> Result<CheckOutcome> {
    let n_fail = match (input.n_fail, input.predicate) {
        (Some(n), _) => n,
        (None, Some(predicate)) => {
            u64::try_from(ds.filter(predicate.clone().fill_null(lit(false))).count()?)
                .unwrap_or(u64::MAX)
        }
        (None, None) => {
            return Err(ValidateError::MissingCheckInput {
                description: input.description.to_string(),
            });
        }
    };

    let n_total = match input.n_total {
        Some(n) => Some(n),
        None if settings.show_percent_sites => Some(ds.count()?),
        None => None,
    };

    if n_fail > 0 {
        sink.info(&format!(
            "Found {n_fail} sites that fail {} check:",
            input.description
        ));
        if settings.show_percent_sites
            && let Some(total) = n_total.filter(|total| *total > 0)
        {
            sink.info(&format!(
                "Percentage of sites that fail: {:.2} %",
                100.0 * (n_fail as f64 / total as f64)
            ));
        }
        if let Some(predicate) = input.predicate {
            let failing = ds.filter(predicate.clone().fill_null(lit(false)));
            show_rows(&failing, input.display, settings.limits, sink)?;
        }
    } else {
        sink.info(&format!("PASSED {} check", input.description));
        if settings.verbose {
            show_rows(ds, input.display, settings.limits, sink)?;
        }
    }

    Ok(CheckOutcome::from_count(input.description, n_fail).with_total(n_total))
}

fn show_rows(
    ds: &Dataset,
    display: &[DisplayField],
    limits: DisplayLimits,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    if display.is_empty() {
        return Ok(());
    }
    let exprs = display.iter().map(DisplayField::aliased).collect();
    let df = ds.head(limits.n_rows).select(exprs).collect()?;
    sink.table(DisplayTable::from_frame(&df)?);
    Ok(())
}
