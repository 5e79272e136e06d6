//! Tests for label-combination expansion.

use std::collections::BTreeMap;

use proptest::prelude::*;
use varqc_model::labels::{POPS, SEXES, default_sort_order};
use varqc_model::{LabelGroups, label_groups, make_label_combos};

#[test]
fn pop_sex_group_combos_follow_canonical_order() {
    let groups = label_groups([
        ("group", &["adj"][..]),
        ("sex", &["XX", "XY"][..]),
        ("pop", &["afr", "nfe"][..]),
    ]);
    let combos = make_label_combos(&groups, &default_sort_order(), "-").unwrap();
    insta::assert_snapshot!(combos.join("\n"), @r"
    afr-XX-adj
    afr-XY-adj
    nfe-XX-adj
    nfe-XY-adj
    ");
}

#[test]
fn release_pops_by_sex_has_eighteen_combos() {
    let groups = label_groups([("pop", &POPS[..]), ("sex", &SEXES[..])]);
    let combos = make_label_combos(&groups, &default_sort_order(), "_").unwrap();
    assert_eq!(combos.len(), 18);
    assert_eq!(combos.first().map(String::as_str), Some("afr_XX"));
    assert_eq!(combos.last().map(String::as_str), Some("sas_XY"));
}

fn axis_values() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,4}", 1..4)
}

proptest! {
    #[test]
    fn combos_are_deterministic_and_complete(
        pops in axis_values(),
        sexes in axis_values(),
        groups in axis_values(),
    ) {
        let mut axes: LabelGroups = BTreeMap::new();
        axes.insert("group".to_string(), groups.clone());
        axes.insert("pop".to_string(), pops.clone());
        axes.insert("sex".to_string(), sexes.clone());

        let order = default_sort_order();
        let first = make_label_combos(&axes, &order, "-").unwrap();
        let second = make_label_combos(&axes, &order, "-").unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), pops.len() * sexes.len() * groups.len());
        let expected_first = format!("{}-{}-{}", pops[0], sexes[0], groups[0]);
        prop_assert_eq!(first[0].as_str(), expected_first.as_str());
    }

    #[test]
    fn axes_follow_sort_order_not_name_order(
        order in Just(vec!["sex", "pop", "group"]).prop_shuffle(),
        pops in axis_values(),
    ) {
        let mut axes = label_groups([("group", &["adj"][..]), ("sex", &["XY"][..])]);
        axes.insert("pop".to_string(), pops.clone());
        let order: Vec<String> = order.into_iter().map(String::from).collect();

        let combos = make_label_combos(&axes, &order, "_").unwrap();
        let expected: Vec<String> = pops
            .iter()
            .map(|pop| {
                order
                    .iter()
                    .map(|axis| match axis.as_str() {
                        "pop" => pop.as_str(),
                        "sex" => "XY",
                        _ => "adj",
                    })
                    .collect::<Vec<_>>()
                    .join("_")
            })
            .collect();
        let mut combos_sorted = combos.clone();
        combos_sorted.sort();
        let mut expected_sorted = expected;
        expected_sorted.sort();
        prop_assert_eq!(combos_sorted, expected_sorted);
        let first_axis = combos[0].split('_').next().unwrap();
        let expected_first = match order[0].as_str() {
            "pop" => pops[0].as_str(),
            "sex" => "XY",
            _ => "adj",
        };
        prop_assert_eq!(first_axis, expected_first);
    }
}
