//! Global versus row array length agreement.
//!
//! Array row annotations such as `freq` are positionally described by
//! global arrays such as `freq_meta`; their lengths must agree.

use std::collections::BTreeMap;

use polars::prelude::*;
use varqc_model::Dataset;
use varqc_model::values::{any_to_i64, cell_u64};

use crate::error::Result;
use crate::expr::list_len;
use crate::reporter::CheckOutcome;
use crate::sink::ReportSink;

const ROW_LEN: &str = "row_len";

/// Compare the length of every row array with the length of each of its
/// associated global arrays.
///
/// Only the first row is checked unless `check_all_rows` is set. Row lengths
/// are tallied in one pass per row field and reused for every global.
pub fn check_global_and_row_annot_lengths(
    ds: &Dataset,
    row_to_globals_check: &BTreeMap<String, Vec<String>>,
    check_all_rows: bool,
    sink: &mut dyn ReportSink,
) -> Result<Vec<CheckOutcome>> {
    let ds = if check_all_rows { ds.clone() } else { ds.head(1) };
    let catalog = ds.catalog()?;

    let mut outcomes = Vec::new();
    for (row_field, global_fields) in row_to_globals_check {
        if !check_all_rows {
            sink.info(&format!(
                "Checking length of {row_field} in first row against length of globals: {}",
                render_list(global_fields)
            ));
        }
        let field = catalog.row(row_field)?;
        let tally = row_length_counter(&ds, field.expr())?;
        let n_rows: u64 = tally.iter().map(|(_, n)| n).sum();

        for global_field in global_fields {
            let global_len = ds.globals().array_len(global_field)?;
            let expected = i64::try_from(global_len).unwrap_or(i64::MAX);
            let n_fail: u64 = tally
                .iter()
                .filter(|(len, _)| len.is_some_and(|len| len != expected))
                .map(|(_, n)| n)
                .sum();
            let failed = n_fail > 0;
            sink.info(&format!(
                "{} global and row lengths comparison: Length of {global_field} in globals \
                 ({global_len}) does {}match length of {row_field} in {} out of {n_rows} rows ({})",
                if failed { "Failed" } else { "Passed" },
                if failed { "NOT " } else { "" },
                if failed { n_fail } else { n_rows },
                render_counter(&tally),
            ));
            outcomes.push(CheckOutcome::from_count(
                format!("length of {row_field} matches length of global {global_field}"),
                n_fail,
            ));
        }
    }
    Ok(outcomes)
}

/// Row count per distinct array length. Missing arrays have no length.
fn row_length_counter(ds: &Dataset, array: Expr) -> Result<Vec<(Option<i64>, u64)>> {
    let df = ds.group_by_aggregate(
        vec![list_len(array).cast(DataType::Int64).alias(ROW_LEN)],
        vec![len().cast(DataType::Int64).alias("n")],
    )?;
    let lengths = df.column(ROW_LEN)?;
    let mut tally = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        tally.push((any_to_i64(lengths.get(row)?), cell_u64(&df, "n", row)?));
    }
    tally.sort();
    Ok(tally)
}

fn render_counter(tally: &[(Option<i64>, u64)]) -> String {
    let entries: Vec<String> = tally
        .iter()
        .map(|(len, n)| match len {
            Some(len) => format!("{len}: {n}"),
            None => format!("NA: {n}"),
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn render_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|item| format!("'{item}'")).collect();
    format!("[{}]", quoted.join(", "))
}
