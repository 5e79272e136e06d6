//! Batched execution of a check family.
//!
//! All failure counts of a family are computed by a single aggregation, so a
//! family with hundreds of checks still costs one pass over the rows.

use polars::prelude::*;
use tracing::debug;
use varqc_model::Dataset;
use varqc_model::values::cell_u64;

use crate::check::FieldCheckRegistry;
use crate::error::Result;
use crate::reporter::{CheckOutcome, FieldCheckInput, ReportSettings, generic_field_check};
use crate::sink::ReportSink;

const TOTAL_ALIAS: &str = "__n_total";

fn count_alias(idx: usize) -> String {
    format!("__check_{idx}")
}

/// Failure count of every check, in registry order, from one aggregation.
///
/// When `with_total` is set the row count is computed in the same pass.
pub fn count_failures(
    ds: &Dataset,
    checks: &FieldCheckRegistry,
    with_total: bool,
) -> Result<(Vec<u64>, Option<usize>)> {
    if checks.is_empty() && !with_total {
        return Ok((Vec::new(), None));
    }
    let mut aggs: Vec<Expr> = checks
        .iter()
        .enumerate()
        .map(|(idx, check)| check.failure_count().alias(count_alias(idx)))
        .collect();
    if with_total {
        aggs.push(len().alias(TOTAL_ALIAS));
    }

    let df = ds.aggregate(aggs)?;
    let counts = (0..checks.len())
        .map(|idx| cell_u64(&df, &count_alias(idx), 0))
        .collect::<varqc_model::Result<Vec<_>>>()?;
    let total = if with_total {
        Some(usize::try_from(cell_u64(&df, TOTAL_ALIAS, 0)?).unwrap_or(usize::MAX))
    } else {
        None
    };
    Ok((counts, total))
}

/// Run every check of a family with one aggregation, then report each.
pub fn generic_field_check_loop(
    ds: &Dataset,
    checks: &FieldCheckRegistry,
    settings: &ReportSettings,
    n_total: Option<usize>,
    sink: &mut dyn ReportSink,
) -> Result<Vec<CheckOutcome>> {
    let need_total = settings.show_percent_sites && n_total.is_none();
    let (counts, counted_total) = count_failures(ds, checks, need_total)?;
    let n_total = n_total.or(counted_total);
    debug!(checks = checks.len(), "evaluated check family");

    let mut outcomes = Vec::with_capacity(checks.len());
    for (check, n_fail) in checks.iter().zip(counts) {
        let input = FieldCheckInput::new(&check.description, &check.display)
            .predicate(&check.predicate)
            .n_fail(n_fail)
            .n_total(n_total);
        outcomes.push(generic_field_check(ds, input, settings, sink)?);
    }
    Ok(outcomes)
}
