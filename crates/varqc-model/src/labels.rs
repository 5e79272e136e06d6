//! Label groups and label-combination expansion.
//!
//! A label group is a named stratification axis (`pop`, `sex`, `group`, ...)
//! with an ordered list of values. Combining one value from each axis, in
//! the canonical axis order, yields the suffix of a stratified field name
//! such as `afr-XX-adj`.

use std::collections::BTreeMap;

use crate::error::{ModelError, Result};

/// Canonical order in which label axes appear in field names.
pub const SORT_ORDER: [&str; 7] = [
    "subset",
    "downsampling",
    "popmax",
    "pop",
    "subpop",
    "sex",
    "group",
];

/// Sample sexes used to stratify frequency annotations.
pub const SEXES: [&str; 2] = ["XX", "XY"];

/// High-quality (`adj`) and unfiltered (`raw`) genotype tiers.
pub const GROUPS: [&str; 2] = ["adj", "raw"];

/// Genetic ancestry groups of the current major release.
pub const POPS: [&str; 9] = [
    "afr",
    "amr",
    "asj",
    "eas",
    "fin",
    "mid",
    "nfe",
    "remaining",
    "sas",
];

/// Variant histograms carried in release VCFs.
pub const HISTS: [&str; 8] = [
    "gq_hist_alt",
    "gq_hist_all",
    "dp_hist_alt",
    "dp_hist_all",
    "ab_hist_alt",
    "qual_hist",
    "age_hist_het",
    "age_hist_hom",
];

/// Axis name -> permissible values.
pub type LabelGroups = BTreeMap<String, Vec<String>>;

/// Owned copy of [`SORT_ORDER`].
pub fn default_sort_order() -> Vec<String> {
    SORT_ORDER.iter().map(|axis| (*axis).to_string()).collect()
}

/// Convenience constructor for label groups from string slices.
pub fn label_groups<const N: usize>(axes: [(&str, &[&str]); N]) -> LabelGroups {
    axes.into_iter()
        .map(|(axis, values)| {
            (
                axis.to_string(),
                values.iter().map(|v| (*v).to_string()).collect(),
            )
        })
        .collect()
}

/// Axis names of `groups` sorted by their position in `sort_order`.
pub fn canonical_axes<'a>(groups: &'a LabelGroups, sort_order: &[String]) -> Result<Vec<&'a str>> {
    let mut ranked = Vec::with_capacity(groups.len());
    for axis in groups.keys() {
        let rank = sort_order
            .iter()
            .position(|candidate| candidate == axis)
            .ok_or_else(|| ModelError::UnknownAxis { axis: axis.clone() })?;
        ranked.push((rank, axis.as_str()));
    }
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, axis)| axis).collect())
}

/// Expand label groups into every delimiter-joined combination.
///
/// Axes are visited in `sort_order` regardless of how `groups` was built, so
/// `{sex: [XX], pop: [afr]}` always yields `afr-XX`. Earlier axes vary
/// slowest. The result has one entry per element of the Cartesian product;
/// an axis with no values therefore yields no combinations.
pub fn make_label_combos(
    groups: &LabelGroups,
    sort_order: &[String],
    delimiter: &str,
) -> Result<Vec<String>> {
    let axes = canonical_axes(groups, sort_order)?;
    let mut combos: Vec<String> = Vec::new();
    for (depth, axis) in axes.iter().enumerate() {
        let values = &groups[*axis];
        if depth == 0 {
            combos = values.clone();
            continue;
        }
        combos = combos
            .iter()
            .flat_map(|prefix| {
                values
                    .iter()
                    .map(move |value| format!("{prefix}{delimiter}{value}"))
            })
            .collect();
    }
    Ok(combos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_follows_sort_order() {
        let groups = label_groups([("sex", &["XX", "XY"]), ("pop", &["afr", "amr"])]);
        let combos = make_label_combos(&groups, &default_sort_order(), "-").unwrap();
        assert_eq!(combos, vec!["afr-XX", "afr-XY", "amr-XX", "amr-XY"]);
    }

    #[test]
    fn test_single_axis_returns_values() {
        let groups = label_groups([("pop", &["afr", "nfe"])]);
        let combos = make_label_combos(&groups, &default_sort_order(), "_").unwrap();
        assert_eq!(combos, vec!["afr", "nfe"]);
    }

    #[test]
    fn test_unknown_axis_is_rejected() {
        let groups = label_groups([("cohort", &["a"])]);
        let err = make_label_combos(&groups, &default_sort_order(), "-").unwrap_err();
        assert!(matches!(err, ModelError::UnknownAxis { axis } if axis == "cohort"));
    }

    #[test]
    fn test_empty_groups_yield_nothing() {
        let combos = make_label_combos(&LabelGroups::new(), &default_sort_order(), "-").unwrap();
        assert!(combos.is_empty());
    }
}
