//! Integration tests for the dataset-level summaries and the release run.

use std::collections::BTreeMap;
use std::io::Cursor;

use polars::prelude::*;
use serde_json::json;
use varqc_model::{Dataset, Globals, HeaderDict, StageToggles, ValidationOptions};
use varqc_validate::checks::filters::IS_FILTERED;
use varqc_validate::checks::{
    FilterSummaryConfig, check_global_and_row_annot_lengths, compare_row_counts,
    pprint_global_anns, summarize_variant_filters, summarize_variants, vcf_field_check,
};
use varqc_validate::{MemorySink, Stage, ValidateError, validate_release};

fn frame(json_lines: &str) -> DataFrame {
    JsonReader::new(Cursor::new(json_lines.as_bytes()))
        .with_json_format(JsonFormat::JsonLines)
        .finish()
        .unwrap()
}

fn release_dataset() -> Dataset {
    Dataset::from_frame(frame(
        r#"{"contig": "chr1", "position": 100, "filters": [], "info": {"allele_type": "snv", "n_alt_alleles": 1, "lcr": false, "segdup": false}}
{"contig": "chr1", "position": 200, "filters": ["RF"], "info": {"allele_type": "snv", "n_alt_alleles": 1, "lcr": true, "segdup": false}}
{"contig": "chr2", "position": 300, "filters": ["AC0", "RF"], "info": {"allele_type": "indel", "n_alt_alleles": 2, "lcr": false, "segdup": false}}
{"contig": "chrX", "position": 400, "filters": ["RF", "AC0"], "info": {"allele_type": "indel", "n_alt_alleles": 1, "lcr": false, "segdup": true}}
{"contig": "chr1", "position": 500, "filters": [], "info": {"allele_type": "snv", "n_alt_alleles": 1, "lcr": null, "segdup": false}}
"#,
    ))
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[test]
fn filter_summary_counts_sets_and_groups() {
    let ds = release_dataset();
    let regions = strings(&["lcr", "segdup", "nonpar"]);
    let site_gt_checks = vec![(
        "multi-allelic".to_string(),
        col("info")
            .struct_()
            .field_by_name("n_alt_alleles")
            .gt(lit(1)),
    )];
    let config = FilterSummaryConfig {
        variant_filter_field: "RF",
        problematic_regions: &regions,
        single_filter_count: true,
        site_gt_checks: &site_gt_checks,
        extra_filter_checks: &[],
    };

    let mut sink = MemorySink::new();
    let summary = summarize_variant_filters(&ds, &config, &mut sink).unwrap();

    assert!(sink.contains("Variant filter counts: {[AC0, RF]: 2, [RF]: 1, []: 2}"));
    assert!(sink.contains("Exploded variant filter counts: {AC0: 2, RF: 3}"));
    assert!(sink.contains("There are 1 multi-allelic sites in the dataset."));
    assert!(sink.contains("nonpar is not in table's info field"));
    assert_eq!(summary.site_gt_counts, vec![("multi-allelic".to_string(), 1)]);
    assert_eq!(
        summary.groupings,
        vec![
            strings(&[IS_FILTERED]),
            strings(&["allele_type"]),
            strings(&["allele_type", "in_problematic_region"]),
            strings(&["allele_type", "in_problematic_region", "n_alt_alleles"]),
        ]
    );

    let tables = sink.tables();
    assert_eq!(tables.len(), 4);
    let by_status = tables[0];
    assert_eq!(by_status.title.as_deref(), Some("Filter fractions by is_filtered"));
    assert_eq!(
        tables[3].title.as_deref(),
        Some("Filter fractions by allele_type, in_problematic_region, n_alt_alleles")
    );
    assert_eq!(
        by_status.columns,
        strings(&[
            IS_FILTERED,
            "n",
            "frac_any_filter",
            "frac_inbreed_coeff",
            "frac_ac0",
            "frac_rf",
            "frac_inbreed_coeff_only",
            "frac_ac0_only",
            "frac_rf_only",
        ])
    );
    // Largest group first.
    assert_eq!(by_status.rows[0][..2], strings(&["true", "3"])[..]);
    assert_eq!(by_status.rows[1][..2], strings(&["false", "2"])[..]);
}

#[test]
fn filter_summary_requires_filters_field() {
    let ds = Dataset::from_frame(frame(r#"{"contig": "chr1", "position": 1}"#));
    let config = FilterSummaryConfig {
        variant_filter_field: "RF",
        problematic_regions: &[],
        single_filter_count: false,
        site_gt_checks: &[],
        extra_filter_checks: &[],
    };
    let err = summarize_variant_filters(&ds, &config, &mut MemorySink::new()).unwrap_err();
    assert!(matches!(err, ValidateError::FieldNotFound { field, .. } if field == "filters"));
}

fn freq_lengths_dataset() -> Dataset {
    let globals = Globals::new()
        .with("freq_meta", json!([{"group": "adj"}, {"group": "raw"}]))
        .with("freq_meta_sample_count", json!([10, 12, 3]));
    Dataset::from_frame(frame(
        r#"{"freq": [{"AC": 1}, {"AC": 2}]}
{"freq": [{"AC": 3}, {"AC": 4}]}
{"freq": [{"AC": 5}, {"AC": 6}, {"AC": 7}]}
"#,
    ))
    .with_globals(globals)
}

fn freq_checks() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([(
        "freq".to_string(),
        strings(&["freq_meta", "freq_meta_sample_count"]),
    )])
}

#[test]
fn global_lengths_check_first_row_by_default() {
    let ds = freq_lengths_dataset();
    let mut sink = MemorySink::new();
    let outcomes = check_global_and_row_annot_lengths(&ds, &freq_checks(), false, &mut sink).unwrap();

    assert_eq!(
        sink.lines(),
        vec![
            "Checking length of freq in first row against length of globals: ['freq_meta', 'freq_meta_sample_count']",
            "Passed global and row lengths comparison: Length of freq_meta in globals (2) does match length of freq in 1 out of 1 rows ({2: 1})",
            "Failed global and row lengths comparison: Length of freq_meta_sample_count in globals (3) does NOT match length of freq in 1 out of 1 rows ({2: 1})",
        ]
    );
    assert!(outcomes[0].passed());
    assert_eq!(
        outcomes[1].description,
        "length of freq matches length of global freq_meta_sample_count"
    );
}

#[test]
fn global_lengths_check_all_rows() {
    let ds = freq_lengths_dataset();
    let mut sink = MemorySink::new();
    let outcomes = check_global_and_row_annot_lengths(&ds, &freq_checks(), true, &mut sink).unwrap();

    assert_eq!(outcomes[0].n_fail, 1);
    assert_eq!(outcomes[1].n_fail, 2);
    assert!(sink.contains(
        "Length of freq_meta in globals (2) does NOT match length of freq in 1 out of 3 rows ({2: 2, 3: 1})"
    ));
}

#[test]
fn global_lengths_require_array_global() {
    let ds = freq_lengths_dataset();
    let checks = BTreeMap::from([("freq".to_string(), strings(&["freq_index_dict"]))]);
    let err = check_global_and_row_annot_lengths(&ds, &checks, false, &mut MemorySink::new())
        .unwrap_err();
    assert!(matches!(err, ValidateError::GlobalNotFound { name } if name == "freq_index_dict"));
}

#[test]
fn global_lengths_count_dictionary_keys() {
    let globals = Globals::new().with("freq_index_dict", json!({"adj": 0, "raw": 1}));
    let ds = freq_lengths_dataset().with_globals(globals);
    let checks = BTreeMap::from([("freq".to_string(), strings(&["freq_index_dict"]))]);
    let mut sink = MemorySink::new();
    let outcomes = check_global_and_row_annot_lengths(&ds, &checks, true, &mut sink).unwrap();

    assert_eq!(outcomes[0].n_fail, 1);
    assert!(sink.contains("Length of freq_index_dict in globals (2) does NOT match"));
}

#[test]
fn variant_summary_reports_missing_contigs() {
    let ds = release_dataset();
    let expected = strings(&["chr1", "chr2", "chrX", "chrY"]);
    let mut sink = MemorySink::new();
    let summary = summarize_variants(&ds, Some(expected.as_slice()), &mut sink).unwrap();

    assert_eq!(summary.n_variants, 5);
    assert_eq!(summary.found_contigs(), strings(&["chr1", "chr2", "chrX"]));
    assert_eq!(summary.missing_contigs, strings(&["chrY"]));
    assert!(summary.unexpected_contigs.is_empty());
    assert!(!summary.contig_check_passed());
    assert!(sink.contains(
        "Dataset has 5 variants distributed across the following contigs: {chr1: 3, chr2: 1, chrX: 1, chrY: 0}"
    ));
    assert!(sink.contains("chrY has no variants called"));
    assert!(sink.contains("FAILED contig check, the following contigs are missing: [chrY]"));
}

#[test]
fn row_counts_compare_two_tables() {
    let ds = release_dataset();
    let mut sink = MemorySink::new();
    assert!(!compare_row_counts(&ds, &ds.head(2), &mut sink).unwrap());
    assert!(compare_row_counts(&ds, &ds, &mut sink).unwrap());
    assert_eq!(sink.lines()[0], "5 rows in left table; 2 rows in right table");
}

fn header(entries: Vec<(&str, Vec<(&str, &str)>)>) -> HeaderDict {
    entries
        .into_iter()
        .map(|(section, fields)| {
            let fields = fields
                .into_iter()
                .map(|(field, description)| (field.to_string(), description.to_string()))
                .collect();
            (section.to_string(), fields)
        })
        .collect()
}

#[test]
fn vcf_header_check_lists_missing_fields_and_descriptions() {
    let ds = release_dataset();
    let header = header(vec![
        (
            "info",
            vec![
                ("AC", "Alternate allele count"),
                ("AF", ""),
                ("dp_hist_all_bin_freq", "Depth histogram"),
                ("dp_hist_all_n_larger", "Depth above the last bin"),
            ],
        ),
        ("filter", vec![("AC0", "Allele count is zero")]),
    ]);
    let mut sink = MemorySink::new();
    let passed = vcf_field_check(
        &ds,
        &header,
        &strings(&["AC", "AF", "END"]),
        None,
        &["dp_hist_all"],
        &mut sink,
    )
    .unwrap();

    assert!(!passed);
    assert!(sink.contains("AF in info field has empty description in VCF header!"));
    assert!(sink.contains("END in info field does not exist in VCF header!"));
    assert!(sink.contains("RF in filter field does not exist in VCF header!"));
    assert!(sink.contains("Missing fields: [RF]"));
    assert!(sink.contains("Missing descriptions: [AF]"));
}

#[test]
fn vcf_header_check_passes_complete_header() {
    let ds = release_dataset();
    let header = header(vec![
        ("info", vec![("AC", "Alternate allele count")]),
        (
            "filter",
            vec![("AC0", "Allele count is zero"), ("RF", "Failed random forest")],
        ),
        ("format", vec![("GT", "Genotype")]),
    ]);
    let mut sink = MemorySink::new();
    let passed = vcf_field_check(
        &ds,
        &header,
        &strings(&["AC", "END"]),
        Some(strings(&["GT"]).as_slice()),
        &[] as &[&str],
        &mut sink,
    )
    .unwrap();

    assert!(passed);
    assert_eq!(sink.lines().last(), Some(&"Passed VCF fields check!"));
}

fn staged_options(stages: StageToggles) -> ValidationOptions {
    ValidationOptions {
        stages,
        ..ValidationOptions::default()
    }
}

#[test]
fn release_run_records_errored_stage_and_continues() {
    let ds = release_dataset();
    let options = staged_options(StageToggles {
        filters: false,
        subset_freq: false,
        samples_sum: false,
        sex_chr: false,
        ..StageToggles::default()
    });
    let mut sink = MemorySink::new();
    let summary = validate_release(&ds, &options, &mut sink).unwrap();

    let headings: Vec<&str> = sink
        .lines()
        .into_iter()
        .filter(|line| line.ends_with("CHECKS:") || line.ends_with("TABLE:"))
        .collect();
    assert_eq!(
        headings,
        vec![
            "BASIC SUMMARY OF INPUT TABLE:",
            "RAW AND ADJ CHECKS:",
            "MISSINGNESS CHECKS:",
        ]
    );
    assert!(sink.contains("raw-adj stage failed: field 'AN-raw' not found in info"));
    assert_eq!(sink.lines().last(), Some(&"VALIDITY CHECKS COMPLETE"));

    let stages: Vec<Stage> = summary.stages.iter().map(|report| report.stage).collect();
    assert_eq!(stages, vec![Stage::Summary, Stage::RawAdj, Stage::Missingness]);
    assert_eq!(summary.errored_stages().count(), 1);
    assert!(summary.has_findings());
    assert_eq!(summary.variant_summary.as_ref().map(|s| s.n_variants), Some(5));

    // Flat metrics plus the walk of the info struct.
    assert_eq!(summary.missingness.len(), 2);
    let missingness = summary.stage(Stage::Missingness).unwrap();
    assert!(missingness.error.is_none());
    assert!(
        missingness
            .outcomes
            .iter()
            .any(|outcome| outcome.description == "lcr missingness <= 0.50")
    );
}

#[test]
fn release_run_rejects_invalid_options() {
    let options = ValidationOptions {
        missingness_threshold: 1.5,
        ..ValidationOptions::default()
    };
    let err = validate_release(&release_dataset(), &options, &mut MemorySink::new()).unwrap_err();
    assert!(matches!(err, ValidateError::Model(_)));
}

#[test]
fn stage_names_round_trip_and_toggle() {
    assert_eq!("sex-chr".parse::<Stage>(), Ok(Stage::SexChr));
    let err = "bogus".parse::<Stage>().unwrap_err();
    assert!(err.contains("expected one of"));

    let mut options = ValidationOptions::default();
    assert!(!Stage::GlobalLengths.enabled(&options));
    options
        .row_to_globals_check
        .insert("freq".to_string(), strings(&["freq_meta"]));
    assert!(Stage::GlobalLengths.enabled(&options));

    assert!(Stage::Missingness.enabled(&options));
    Stage::Missingness.disable(&mut options);
    assert!(!Stage::Missingness.enabled(&options));
}

#[test]
fn globals_dump_lists_every_annotation() {
    let ds = freq_lengths_dataset();
    let mut sink = MemorySink::new();
    pprint_global_anns(&ds, &mut sink);
    let text = sink.text();
    assert!(text.contains("freq_meta"));
    assert!(text.contains("freq_meta_sample_count"));
}
