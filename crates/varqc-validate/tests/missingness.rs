//! Integration tests for the missingness walker and array unfurling.

use std::collections::BTreeMap;
use std::io::Cursor;

use polars::prelude::*;
use serde_json::json;
use varqc_model::{Dataset, Globals};
use varqc_validate::{
    MemorySink, ValidateError, check_array_struct_missingness, check_missingness_of_struct,
    compute_missingness, flatten_missingness_struct, unfurl_array_annotations,
};

fn frame(json_lines: &str) -> DataFrame {
    JsonReader::new(Cursor::new(json_lines.as_bytes()))
        .with_json_format(JsonFormat::JsonLines)
        .finish()
        .unwrap()
}

fn nested_struct_dataset() -> Dataset {
    let df = frame(
        r#"{"idx": 0, "s": {"a": 1, "b": "value1", "c": {"d": [null, null], "e": "test1", "f": ["v1", "v2"]}}}
{"idx": 1, "s": {"a": 2, "b": "value2", "c": {"d": ["not missing", null], "e": null, "f": ["v3", null]}}}
{"idx": 2, "s": {"a": 3, "b": null, "c": {"d": null, "e": null, "f": []}}}
{"idx": 3, "s": {"a": 4, "b": "value3", "c": {"d": ["foo", "bar"], "e": "test2", "f": []}}}
{"idx": 4, "s": {"a": 5, "b": "value4", "c": {"d": [], "e": "test3", "f": []}}}
"#,
    );
    Dataset::from_frame(df).with_set_field("s.c.f")
}

fn freq_dataset() -> Dataset {
    let df = frame(
        r#"{"idx": 0, "freq": [{"AC": 5, "AF": 0.1, "AN_eas": 20, "AN_sas": 3}, {"AC": 10, "AF": 0.05, "AN_eas": 5, "AN_sas": null}]}
{"idx": 1, "freq": [{"AC": 6, "AF": 0.08, "AN_eas": null, "AN_sas": 4}, {"AC": 8, "AF": 0.5, "AN_eas": null, "AN_sas": null}]}
{"idx": 2, "freq": [{"AC": 65, "AF": 0.18, "AN_eas": null, "AN_sas": 2}, {"AC": 88, "AF": 0.2, "AN_eas": null, "AN_sas": null}]}
{"idx": 3, "freq": [{"AC": 8, "AF": 0.08, "AN_eas": 16, "AN_sas": 2}, null]}
"#,
    );
    let globals = Globals::new().with("freq_index_dict", json!({"adj": 0, "raw": 1}));
    Dataset::from_frame(df).with_globals(globals)
}

fn freq_index() -> BTreeMap<String, String> {
    BTreeMap::from([("freq".to_string(), "freq_index_dict".to_string())])
}

#[test]
fn struct_missingness_matches_expected_fractions() {
    let ds = nested_struct_dataset();
    let tree = check_missingness_of_struct(&ds, "s").unwrap();
    let fractions: BTreeMap<String, f64> = flatten_missingness_struct(&ds, &tree)
        .unwrap()
        .into_iter()
        .collect();

    let expected = [
        ("s.a", 0.0),
        ("s.b", 0.2),
        ("s.c.d", 0.6),
        ("s.c.e", 0.4),
        ("s.c.f", 0.6),
    ];
    assert_eq!(fractions.len(), expected.len());
    for (path, value) in expected {
        let got = fractions[path];
        assert!((got - value).abs() < 1e-12, "{path}: expected {value}, got {got}");
    }
}

#[test]
fn struct_missingness_fractions_are_bounded() {
    let ds = nested_struct_dataset();
    let tree = check_missingness_of_struct(&ds, "s").unwrap();
    for (_, fraction) in flatten_missingness_struct(&ds, &tree).unwrap() {
        assert!((0.0..=1.0).contains(&fraction));
    }
}

#[test]
fn unfurl_produces_one_field_per_member_and_label() {
    let ds = freq_dataset();
    let unfurled = unfurl_array_annotations(&ds, &freq_index()).unwrap();
    let mut names: Vec<&str> = unfurled.iter().map(|(name, _)| name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "AC_adj", "AC_raw", "AF_adj", "AF_raw", "AN_eas_adj", "AN_eas_raw", "AN_sas_adj",
            "AN_sas_raw",
        ]
    );

    let exprs: Vec<Expr> = unfurled
        .iter()
        .map(|(name, expr)| expr.clone().alias(name.as_str()))
        .collect();
    let df = ds.select(exprs).collect().unwrap();

    let ac_adj: Vec<Option<i64>> = df.column("AC_adj").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(ac_adj, vec![Some(5), Some(6), Some(65), Some(8)]);

    let ac_raw: Vec<Option<i64>> = df.column("AC_raw").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(ac_raw, vec![Some(10), Some(8), Some(88), None]);

    let an_eas_adj: Vec<Option<i64>> = df
        .column("AN_eas_adj")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(an_eas_adj, vec![Some(20), None, None, Some(16)]);

    // The null second element makes every raw field of the last row missing.
    let row = 3;
    for name in ["AC_raw", "AF_raw", "AN_eas_raw", "AN_sas_raw"] {
        assert!(df.column(name).unwrap().get(row).unwrap().is_null(), "{name}");
    }
}

#[test]
fn unfurl_requires_row_array_and_global_dict() {
    let ds = freq_dataset();

    let missing_array = BTreeMap::from([("faf".to_string(), "freq_index_dict".to_string())]);
    assert!(matches!(
        unfurl_array_annotations(&ds, &missing_array),
        Err(ValidateError::FieldNotFound { field, .. }) if field == "faf"
    ));

    let missing_dict = BTreeMap::from([("freq".to_string(), "faf_index_dict".to_string())]);
    assert!(matches!(
        unfurl_array_annotations(&ds, &missing_dict),
        Err(ValidateError::GlobalNotFound { name }) if name == "faf_index_dict"
    ));
}

#[test]
fn unfurl_out_of_range_index_reads_missing() {
    let ds = freq_dataset().with_globals(
        Globals::new().with("freq_index_dict", json!({"adj": 0, "extra": 7})),
    );
    let fractions: BTreeMap<String, f64> = check_array_struct_missingness(&ds, &freq_index())
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(fractions["AC_extra"], 1.0);
    assert_eq!(fractions["AC_adj"], 0.0);
}

#[test]
fn array_struct_missingness_counts_unfurled_nulls() {
    let ds = freq_dataset();
    let fractions: BTreeMap<String, f64> = check_array_struct_missingness(&ds, &freq_index())
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(fractions["AC_adj"], 0.0);
    assert_eq!(fractions["AC_raw"], 0.25);
    assert_eq!(fractions["AN_eas_adj"], 0.5);
    assert_eq!(fractions["AN_sas_raw"], 1.0);
}

#[test]
fn compute_missingness_reports_each_metric() {
    let df = frame(
        r#"{"rsid": "rs1", "info": {"AC": 1, "AF": null}}
{"rsid": null, "info": {"AC": 2, "AF": null}}
{"rsid": null, "info": {"AC": null, "AF": 0.5}}
{"rsid": null, "info": {"AC": 4, "AF": null}}
"#,
    );
    let ds = Dataset::from_frame(df);
    let mut sink = MemorySink::new();
    let report = compute_missingness(
        &ds,
        &["AC".to_string(), "AF".to_string()],
        &["rsid".to_string()],
        4,
        0.5,
        &mut sink,
    )
    .unwrap();

    assert_eq!(report.n_failed(), 2);
    assert!(report.get("AC").unwrap().passed);
    assert_eq!(report.get("AF").unwrap().n_missing, Some(3));
    assert!(sink.contains(
        "Missingness threshold (upper cutoff for what is allowed for missingness checks): 0.50"
    ));
    assert!(sink.contains("Passed missingness check for AC: 1 sites or 25.00% missing"));
    assert!(sink.contains("FAILED missingness check for AF: 3 sites or 75.00% missing"));
    assert!(sink.contains("FAILED missingness check for rsid: 3 sites or 75.00% missing"));
    assert_eq!(sink.lines().last(), Some(&"2 missing metrics checks failed"));
}

#[test]
fn missingness_over_no_rows_is_zero() {
    let ds = nested_struct_dataset().filter(col("idx").gt(lit(100)));
    let tree = check_missingness_of_struct(&ds, "s").unwrap();
    for (_, fraction) in flatten_missingness_struct(&ds, &tree).unwrap() {
        assert_eq!(fraction, 0.0);
    }
}
