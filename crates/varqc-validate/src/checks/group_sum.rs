//! Sum-group consistency.
//!
//! A supergroup field such as `AC-adj` must equal the sum of its stratified
//! fields (`AC-afr-adj`, `AC-amr-adj`, ...). Stratified fields missing from
//! the dataset are skipped with a warning; the supergroup field itself must
//! exist.

use tracing::warn;
use varqc_model::labels::canonical_axes;
use varqc_model::{
    Dataset, FieldCatalog, FieldNaming, LabelGroups, ValidationOptions, make_label_combos,
};

use crate::check::{FieldCheck, FieldCheckRegistry};
use crate::error::{Result, ValidateError};
use crate::executor::generic_field_check_loop;
use crate::expr::sum_skipping_missing;
use crate::reporter::{CheckOutcome, ReportSettings};
use crate::sink::ReportSink;

const GROUP_AXIS: &str = "group";

/// Build one check per metric comparing `{metric}{subset}{group}` with the
/// sum of its label-combination fields.
///
/// `label_groups` must contain a `group` axis; its first value names the
/// supergroup. The remaining axes, in canonical order, name the sum group.
pub fn make_group_sum_expr_dict(
    catalog: &FieldCatalog,
    subset: &str,
    label_groups: &LabelGroups,
    sort_order: &[String],
    naming: &FieldNaming,
    metrics: &[String],
    sink: &mut dyn ReportSink,
) -> Result<FieldCheckRegistry> {
    let d = &naming.delimiter;
    let combos = make_label_combos(label_groups, sort_order, d)?;

    let group = label_groups
        .get(GROUP_AXIS)
        .and_then(|values| values.first())
        .ok_or_else(|| ValidateError::InvalidLabelGroups {
            reason: "a non-empty 'group' axis is required".to_string(),
        })?;
    let mut strata = label_groups.clone();
    strata.remove(GROUP_AXIS);
    let sum_group = canonical_axes(&strata, sort_order)?.join(d);

    let mut checks = FieldCheckRegistry::new();
    for metric in metrics {
        let prefix = naming.prefix(metric, subset);

        let mut terms = Vec::with_capacity(combos.len());
        for label in &combos {
            let name = format!("{prefix}{label}");
            match catalog.try_info(&name) {
                Some(field) => terms.push(field.expr()),
                None => {
                    warn!(field = %name, "stratified field absent; skipped from sum");
                    sink.warn(&format!("{name} is not in table's info field"));
                }
            }
        }

        let total = catalog.info(&format!("{prefix}{group}"))?;
        let sum_name = format!("sum{d}{prefix}{group}{d}{sum_group}");
        let sum = sum_skipping_missing(terms);

        checks.insert(
            FieldCheck::new(
                format!("{} = {sum_name}", total.name()),
                total.expr().neq(sum.clone()),
            )
            .show(&total)
            .show_expr(sum_name, sum),
        );
    }
    Ok(checks)
}

/// Check population, sex and population-by-sex sums for every subset and
/// callstat group in one batched family.
pub fn sum_group_callstats(
    ds: &Dataset,
    options: &ValidationOptions,
    settings: &ReportSettings,
    sink: &mut dyn ReportSink,
) -> Result<Vec<CheckOutcome>> {
    let catalog = ds.catalog()?;
    let naming = options.naming();

    let mut subsets_and_pops: Vec<(String, Vec<String>)> = options
        .subsets
        .iter()
        .map(|subset| (subset.clone(), options.pops.clone()))
        .collect();
    for (subset, pops) in &options.sample_sum_sets_and_pops {
        match subsets_and_pops.iter_mut().find(|(s, _)| s == subset) {
            Some(entry) => entry.1 = pops.clone(),
            None => subsets_and_pops.push((subset.clone(), pops.clone())),
        }
    }

    let mut checks = FieldCheckRegistry::new();
    for (subset, pops) in &subsets_and_pops {
        for group in &options.groups {
            let strata: [Vec<(&str, &Vec<String>)>; 3] = [
                vec![("pop", pops)],
                vec![("sex", &options.sexes)],
                vec![("pop", pops), ("sex", &options.sexes)],
            ];
            for axes in strata {
                let mut label_groups = LabelGroups::new();
                label_groups.insert(GROUP_AXIS.to_string(), vec![group.clone()]);
                for (axis, values) in axes {
                    label_groups.insert(axis.to_string(), values.clone());
                }
                checks.extend(make_group_sum_expr_dict(
                    &catalog,
                    subset,
                    &label_groups,
                    &options.sort_order,
                    &naming,
                    &options.sum_metrics,
                    sink,
                )?);
            }
        }
    }

    generic_field_check_loop(ds, &checks, &settings.with_percent(false), None, sink)
}
