//! Summation checks over caller-defined field groups.

use std::collections::BTreeMap;

use polars::prelude::Expr;
use serde::{Deserialize, Serialize};
use tracing::warn;
use varqc_model::values::cell_u64;
use varqc_model::{Dataset, FieldCatalog, FieldRef};

use crate::error::{Result, ValidateError};
use crate::expr::{count_where, sum_propagating_missing};
use crate::sink::ReportSink;

/// Fields whose sum must equal an expected total, e.g. every
/// `AC_{pop}_adj` against `AC_adj`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummationGroup {
    /// Name of the computed sum.
    pub name: String,
    pub values_to_sum: Vec<String>,
    pub expected_total: String,
}

impl SummationGroup {
    pub fn new(
        name: impl Into<String>,
        values_to_sum: impl IntoIterator<Item = impl Into<String>>,
        expected_total: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            values_to_sum: values_to_sum.into_iter().map(Into::into).collect(),
            expected_total: expected_total.into(),
        }
    }
}

/// Row fields first, then info fields.
fn lookup(catalog: &FieldCatalog, name: &str) -> Option<FieldRef> {
    catalog.row(name).ok().or_else(|| catalog.try_info(name))
}

/// Number of rows, per group, where the sum of the group's fields differs
/// from its expected total.
///
/// Fields absent from the dataset are left out of the sum with a warning. A
/// missing term makes that row's sum missing, and rows with a missing sum or
/// total never count as mismatches. All groups share one pass over the rows.
pub fn compute_and_check_summations(
    ds: &Dataset,
    groups: &[SummationGroup],
    sink: &mut dyn ReportSink,
) -> Result<BTreeMap<String, u64>> {
    if groups.is_empty() {
        return Ok(BTreeMap::new());
    }
    let catalog = ds.catalog()?;

    let mut aggs: Vec<Expr> = Vec::with_capacity(groups.len());
    for group in groups {
        let mut terms = Vec::with_capacity(group.values_to_sum.len());
        for name in &group.values_to_sum {
            match lookup(&catalog, name) {
                Some(field) => terms.push(field.expr()),
                None => {
                    warn!(field = %name, group = %group.name, "summation field absent");
                    sink.warn(&format!("{name} is not in table's row or info fields"));
                }
            }
        }
        let total = lookup(&catalog, &group.expected_total).ok_or_else(|| {
            ValidateError::FieldNotFound {
                field: group.expected_total.clone(),
                scope: format!("row fields or {}", catalog.info_root()),
            }
        })?;
        let sum = sum_propagating_missing(terms);
        aggs.push(count_where(sum.neq(total.expr())).alias(group.name.as_str()));
    }

    let df = ds.aggregate(aggs)?;
    let mut mismatches = BTreeMap::new();
    for group in groups {
        mismatches.insert(group.name.clone(), cell_u64(&df, &group.name, 0)?);
    }
    Ok(mismatches)
}
