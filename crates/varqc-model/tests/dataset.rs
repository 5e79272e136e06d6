//! Tests for the dataset handle.

use polars::prelude::*;
use serde_json::json;
use varqc_model::{Dataset, Globals, ModelError};

fn sample_dataset() -> Dataset {
    let df = df! {
        "contig" => ["chr1", "chr1", "chrX", "chrY"],
        "position" => [100i64, 200, 5_000_000, 3_000_000],
        "AC-adj" => [Some(1i64), None, Some(3), Some(0)],
        "AN-adj" => [Some(10i64), None, Some(12), Some(8)],
    }
    .unwrap();
    let rows = df.lazy().select([
        col("contig"),
        col("position"),
        as_struct(vec![col("AC-adj"), col("AN-adj")]).alias("info"),
    ]);
    Dataset::new(rows).with_globals(Globals::new().with("freq_meta", json!([{"group": "adj"}])))
}

#[test]
fn schema_lists_row_and_info_fields() {
    let ds = sample_dataset();
    assert_eq!(ds.row_fields().unwrap(), vec!["contig", "position", "info"]);
    assert_eq!(ds.info_fields().unwrap(), vec!["AC-adj", "AN-adj"]);
    assert!(ds.has_info_field("AN-adj").unwrap());
    assert!(!ds.has_row_field("filters").unwrap());
}

#[test]
fn filter_returns_new_handle() {
    let ds = sample_dataset();
    let chr1 = ds.filter(col("contig").eq(lit("chr1")));
    assert_eq!(chr1.count().unwrap(), 2);
    assert_eq!(ds.count().unwrap(), 4);
}

#[test]
fn aggregate_evaluates_all_expressions_at_once() {
    let ds = sample_dataset();
    let catalog = ds.catalog().unwrap();
    let ac = catalog.info("AC-adj").unwrap();
    let out = ds
        .aggregate(vec![
            ac.expr().is_null().cast(DataType::Int64).sum().alias("missing"),
            ac.expr().sum().alias("total"),
        ])
        .unwrap();
    assert_eq!(out.height(), 1);
    assert_eq!(varqc_model::values::cell_u64(&out, "missing", 0).unwrap(), 1);
    assert_eq!(varqc_model::values::cell_u64(&out, "total", 0).unwrap(), 4);
}

#[test]
fn explode_emits_one_row_per_element() {
    let filters = Series::new(
        "filters".into(),
        [
            Series::new("".into(), ["AC0", "RF"]),
            Series::new("".into(), Vec::<&str>::new()),
            Series::new("".into(), ["RF"]),
        ],
    );
    let df = DataFrame::new(vec![filters.into_column()]).unwrap();
    let exploded = Dataset::from_frame(df).explode("filters").unwrap();
    assert_eq!(exploded.count().unwrap(), 4);
}

#[test]
fn checkpoint_round_trips_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.parquet");
    let ds = sample_dataset().persist().unwrap();
    let restored = ds.checkpoint(&path).unwrap();
    assert!(path.exists());
    assert_eq!(restored.count().unwrap(), 4);
    assert!(restored.global("freq_meta").is_ok());
}

#[test]
fn missing_global_is_an_error() {
    let ds = sample_dataset();
    assert!(matches!(
        ds.global("faf_index_dict"),
        Err(ModelError::GlobalNotFound { .. })
    ));
}
