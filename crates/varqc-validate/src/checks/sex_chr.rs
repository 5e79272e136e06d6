//! Sex chromosome annotation checks.
//!
//! XX-stratified metrics must be missing on Y, and on the non-PAR part of X
//! the XX `nhomalt` fields must equal their unstratified counterparts.

use polars::prelude::*;
use tracing::debug;
use varqc_model::values::{cell_string, cell_u64};
use varqc_model::{Dataset, ReferenceGenome};

use crate::check::{FieldCheck, FieldCheckRegistry};
use crate::error::Result;
use crate::executor::generic_field_check_loop;
use crate::expr::count_where;
use crate::reporter::{CheckOutcome, ReportSettings};
use crate::sink::ReportSink;

fn defined_alias(idx: usize) -> String {
    format!("__defined_{idx}")
}

fn example_alias(idx: usize) -> String {
    format!("__example_{idx}")
}

/// Run the Y and X non-PAR checks.
///
/// `info_metrics` are the candidate info field names; those containing
/// `{delimiter}XX` are the XX metrics. The Y check runs only when the Y
/// contig is among `contigs`.
pub fn check_sex_chr_metrics(
    ds: &Dataset,
    info_metrics: &[String],
    contigs: &[String],
    delimiter: &str,
    genome: ReferenceGenome,
    settings: &ReportSettings,
    sink: &mut dyn ReportSink,
) -> Result<Vec<CheckOutcome>> {
    let catalog = ds.catalog()?;
    let xx_marker = format!("{delimiter}XX");
    let xx_metrics: Vec<&String> = info_metrics
        .iter()
        .filter(|metric| metric.contains(&xx_marker))
        .collect();

    let mut outcomes = Vec::new();

    if contigs.iter().any(|contig| contig == genome.y_contig()) && !xx_metrics.is_empty() {
        sink.info("Check values of XX metrics for Y variants are NA:");
        let on_y = ds.filter(genome.on_y());

        let mut aggs = Vec::with_capacity(xx_metrics.len() * 2);
        for (idx, metric) in xx_metrics.iter().enumerate() {
            let value = catalog.info(metric)?.expr();
            aggs.push(count_where(value.clone().is_not_null()).alias(defined_alias(idx)));
            aggs.push(
                value
                    .clone()
                    .filter(value.is_not_null())
                    .first()
                    .alias(example_alias(idx)),
            );
        }
        let df = on_y.aggregate(aggs)?;

        for (idx, metric) in xx_metrics.iter().enumerate() {
            let n_defined = cell_u64(&df, &defined_alias(idx), 0)?;
            let description = format!("{metric} = None check for Y variants");
            if n_defined > 0 {
                let example = cell_string(&df, &example_alias(idx), 0)?;
                sink.info(&format!("FAILED {description}. Values found: [{example}]"));
            } else {
                sink.info(&format!("PASSED {description}"));
            }
            outcomes.push(CheckOutcome::from_count(description, n_defined));
        }
    }

    let x_nonpar = ds.filter(genome.in_x_nonpar()).persist()?;
    let n_nonpar = x_nonpar.count()?;
    debug!(contig = genome.x_contig(), n_nonpar, "selected X non-PAR sites");
    sink.info(&format!("Found {n_nonpar} X nonpar sites"));
    sink.info(
        "Check values of XX metrics for X nonpar variants are equal to the values of the \
         corresponding non-sex-stratified metrics:",
    );

    let mut checks = FieldCheckRegistry::new();
    for metric in xx_metrics.iter().filter(|metric| metric.contains("nhomalt")) {
        let stratified = catalog.info(metric)?;
        let standard = catalog.info(&metric.replace(&xx_marker, ""))?;
        checks.insert(
            FieldCheck::new(
                format!("{} == {}", stratified.name(), standard.name()),
                stratified.expr().neq(standard.expr()),
            )
            .show(&stratified)
            .show(&standard),
        );
    }
    outcomes.extend(generic_field_check_loop(
        &x_nonpar,
        &checks,
        &settings.with_percent(false),
        Some(n_nonpar),
        sink,
    )?);

    Ok(outcomes)
}
