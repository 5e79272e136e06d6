//! Whole-callset versus subset frequency comparison.
//!
//! For every non-empty subset the whole-callset field is compared with the
//! subset field. Rows where the two are *equal* are counted and shown: a
//! subset's call statistics coinciding with the whole callset is surfaced
//! for review.

use varqc_model::values::cell_u64;
use varqc_model::{Dataset, FieldCatalog, FieldNaming};

use crate::check::{FieldCheck, FieldCheckRegistry};
use crate::error::Result;
use crate::executor::generic_field_check_loop;
use crate::expr::count_where;
use crate::reporter::{CheckOutcome, ReportSettings};
use crate::sink::ReportSink;

pub fn make_subset_freq_checks(
    catalog: &FieldCatalog,
    subsets: &[String],
    metrics: &[String],
    naming: &FieldNaming,
    sink: &mut dyn ReportSink,
) -> Result<FieldCheckRegistry> {
    let mut checks = FieldCheckRegistry::new();
    for subset in subsets.iter().filter(|subset| !subset.is_empty()) {
        for metric in metrics {
            for tier in ["adj", "raw"] {
                sink.info(&format!(
                    "Comparing the {subset} subset's {tier} {metric} to entire callset's {tier} {metric}"
                ));
                let callset = catalog.info(&naming.field(metric, "", tier))?;
                let subset_field = catalog.info(&naming.field(metric, subset, tier))?;
                checks.insert(
                    FieldCheck::new(
                        format!("{} != {}", callset.name(), subset_field.name()),
                        callset.expr().eq(subset_field.expr()),
                    )
                    .show(&callset)
                    .show(&subset_field),
                );
            }
        }
    }
    Ok(checks)
}

pub fn compare_subset_freqs(
    ds: &Dataset,
    subsets: &[String],
    metrics: &[String],
    naming: &FieldNaming,
    settings: &ReportSettings,
    sink: &mut dyn ReportSink,
) -> Result<Vec<CheckOutcome>> {
    let catalog = ds.catalog()?;
    let checks = make_subset_freq_checks(&catalog, subsets, metrics, naming, sink)?;
    let outcomes = generic_field_check_loop(ds, &checks, settings, None, sink)?;

    // Spot check of raw AC coverage.
    let raw_ac = catalog.info(&naming.field("AC", "", "raw"))?;
    let df = ds.aggregate(vec![count_where(raw_ac.expr().is_not_null()).alias("n")])?;
    sink.info(&format!(
        "Total defined raw AC count: {}",
        cell_u64(&df, "n", 0)?
    ));

    Ok(outcomes)
}
