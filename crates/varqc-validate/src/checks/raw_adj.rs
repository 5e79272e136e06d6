//! Consistency of raw and adj call statistics.
//!
//! For each genotype tier, AC and nhomalt must be defined exactly when AN is,
//! AF additionally must be missing when AN is zero, raw AC/AF must be
//! positive, adj AC/AF non-negative, and raw AC/AN/nhomalt never below adj.

use polars::prelude::*;
use varqc_model::{Dataset, FieldCatalog, FieldNaming};

use crate::check::{FieldCheck, FieldCheckRegistry};
use crate::error::Result;
use crate::executor::generic_field_check_loop;
use crate::reporter::{CheckOutcome, ReportSettings};
use crate::sink::ReportSink;

const TIERS: [&str; 2] = ["raw", "adj"];

/// Build the raw/adj checks for the whole callset and every subset.
pub fn make_raw_adj_checks(
    catalog: &FieldCatalog,
    subsets: &[String],
    naming: &FieldNaming,
) -> Result<FieldCheckRegistry> {
    let mut checks = FieldCheckRegistry::new();

    for tier in TIERS {
        let an = catalog.info(&naming.field("AN", "", tier))?;

        for metric in ["AC", "nhomalt"] {
            let field = catalog.info(&naming.field(metric, "", tier))?;
            let violated = when(an.expr().is_null())
                .then(field.expr().is_not_null())
                .otherwise(field.expr().is_null());
            checks.insert(
                FieldCheck::new(
                    format!(
                        "{} defined when AN defined and missing when AN missing",
                        field.name()
                    ),
                    violated,
                )
                .show(&an)
                .show(&field),
            );
        }

        let af = catalog.info(&naming.field("AF", "", tier))?;
        let violated = when(an.expr().is_null())
            .then(af.expr().is_not_null())
            .otherwise(an.expr().gt(lit(0)).and(af.expr().is_null()));
        checks.insert(
            FieldCheck::new(
                format!(
                    "{} defined when AN defined (and > 0) and missing when AN missing",
                    af.name()
                ),
                violated,
            )
            .show(&an)
            .show(&af),
        );

        checks.insert(
            FieldCheck::new(
                format!("{} missing when AN 0", af.name()),
                an.expr().eq(lit(0)).and(af.expr().is_not_null()),
            )
            .show(&an)
            .show(&af),
        );
    }

    let filters = catalog.row("filters").ok();
    for metric in ["AC", "AF"] {
        let raw = catalog.info(&naming.field(metric, "", "raw"))?;
        checks.insert(
            FieldCheck::new(format!("{} > 0", raw.name()), raw.expr().lt_eq(lit(0))).show(&raw),
        );

        let adj = catalog.info(&naming.field(metric, "", "adj"))?;
        let mut check =
            FieldCheck::new(format!("{} >= 0", adj.name()), adj.expr().lt(lit(0))).show(&adj);
        if let Some(filters) = &filters {
            check = check.show(filters);
        }
        checks.insert(check);
    }

    for metric in ["AC", "AN", "nhomalt"] {
        let overall = std::iter::once(String::new());
        for subset in overall.chain(subsets.iter().cloned()) {
            let raw = catalog.info(&naming.field(metric, &subset, "raw"))?;
            let adj = catalog.info(&naming.field(metric, &subset, "adj"))?;
            checks.insert(
                FieldCheck::new(
                    format!("{} >= {}", raw.name(), adj.name()),
                    raw.expr().lt(adj.expr()),
                )
                .show(&raw)
                .show(&adj),
            );
        }
    }

    Ok(checks)
}

/// Run the raw/adj checks as one batched family.
pub fn check_raw_and_adj_callstats(
    ds: &Dataset,
    subsets: &[String],
    naming: &FieldNaming,
    settings: &ReportSettings,
    sink: &mut dyn ReportSink,
) -> Result<Vec<CheckOutcome>> {
    let checks = make_raw_adj_checks(&ds.catalog()?, subsets, naming)?;
    generic_field_check_loop(ds, &checks, &settings.with_percent(false), None, sink)
}
