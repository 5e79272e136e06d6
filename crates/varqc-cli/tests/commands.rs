//! End-to-end tests for the CLI commands over files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;
use varqc_cli::cli::{DatasetArgs, HeaderArgs, MissingnessArgs, ValidateArgs};
use varqc_cli::commands::{run_header, run_missingness, run_validate};
use varqc_cli::summary::{failed_check_table, stage_table};
use varqc_validate::Stage;

const ROWS: &str = r#"{"contig": "chr1", "position": 100, "filters": [], "info": {"allele_type": "snv", "n_alt_alleles": 1, "lcr": false, "segdup": false}}
{"contig": "chr1", "position": 200, "filters": ["RF"], "info": {"allele_type": "snv", "n_alt_alleles": 1, "lcr": true, "segdup": false}}
{"contig": "chr2", "position": 300, "filters": ["AC0", "RF"], "info": {"allele_type": "indel", "n_alt_alleles": 2, "lcr": false, "segdup": false}}
{"contig": "chrX", "position": 400, "filters": ["RF", "AC0"], "info": {"allele_type": "indel", "n_alt_alleles": 1, "lcr": false, "segdup": true}}
{"contig": "chr1", "position": 500, "filters": [], "info": {"allele_type": "snv", "n_alt_alleles": 1, "lcr": null, "segdup": false}}
"#;

const CONFIG: &str = r#"
[stages]
filters = false
raw_adj = false
subset_freq = false
samples_sum = false
sex_chr = false
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn dataset_args(dir: &Path) -> DatasetArgs {
    DatasetArgs {
        rows: write(dir, "rows.ndjson", ROWS),
        globals: None,
        set_fields: vec!["filters".to_string()],
    }
}

fn validate_args(dir: &Path) -> ValidateArgs {
    ValidateArgs {
        dataset: dataset_args(dir),
        config: Some(write(dir, "varqc.toml", CONFIG)),
        skip: Vec::new(),
        verbose_checks: false,
        missingness_threshold: Some(0.1),
        expected_contigs: vec![
            "chr1".to_string(),
            "chr2".to_string(),
            "chrX".to_string(),
            "chrY".to_string(),
        ],
        array_struct_missingness: false,
        summary_json: None,
        fail_on_findings: true,
    }
}

#[test]
fn validate_runs_enabled_stages_and_finds_failures() {
    let dir = TempDir::new().unwrap();
    let result = run_validate(&validate_args(dir.path())).unwrap();
    let summary = &result.summary;

    let stages: Vec<Stage> = summary.stages.iter().map(|stage| stage.stage).collect();
    assert_eq!(stages, vec![Stage::Summary, Stage::Missingness]);
    assert!(summary.errored_stages().next().is_none());

    let variants = summary.variant_summary.as_ref().unwrap();
    assert_eq!(variants.n_variants, 5);
    assert_eq!(variants.missing_contigs, vec!["chrY"]);

    // chrY is absent and `lcr` is 20% missing in both missingness views.
    assert_eq!(summary.n_failed(), 3);
    assert!(summary.has_findings());

    let failed = failed_check_table(summary).to_string();
    assert!(failed.contains("expected contigs"));
    assert!(stage_table(summary).to_string().contains("missingness"));
}

#[test]
fn skipped_stages_do_not_run() {
    let dir = TempDir::new().unwrap();
    let mut args = validate_args(dir.path());
    args.skip = vec![Stage::Missingness];
    let result = run_validate(&args).unwrap();

    assert!(result.summary.stage(Stage::Missingness).is_none());
    assert!(result.summary.missingness.is_empty());
    assert_eq!(result.summary.n_failed(), 1);
}

#[test]
fn validate_writes_summary_json() {
    let dir = TempDir::new().unwrap();
    let mut args = validate_args(dir.path());
    let json_path = dir.path().join("summary.json");
    args.summary_json = Some(json_path.clone());
    run_validate(&args).unwrap();

    let document: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert!(document["generated_at"].is_string());
    assert!(document["rows"].as_str().unwrap().ends_with("rows.ndjson"));
    assert_eq!(document["summary"]["stages"].as_array().unwrap().len(), 2);
    assert_eq!(document["summary"]["stages"][0]["stage"], "Summary");
    assert_eq!(document["summary"]["variant_summary"]["n_variants"], 5);
}

#[test]
fn validate_reports_unreadable_config() {
    let dir = TempDir::new().unwrap();
    let mut args = validate_args(dir.path());
    args.config = Some(write(dir.path(), "broken.toml", "delimiter = [1, 2"));
    let err = run_validate(&args).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}

#[test]
fn missingness_walks_struct_field() {
    let dir = TempDir::new().unwrap();
    let args = MissingnessArgs {
        dataset: dataset_args(dir.path()),
        field: "info".to_string(),
        threshold: 0.1,
    };
    let report = run_missingness(&args).unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.n_failed(), 1);
    let failed = report.outcomes.iter().find(|outcome| !outcome.passed).unwrap();
    assert!(failed.metric.ends_with("lcr"));
    assert!((failed.fraction - 0.2).abs() < 1e-9);
}

#[test]
fn missingness_rejects_threshold_outside_unit_interval() {
    let dir = TempDir::new().unwrap();
    let args = MissingnessArgs {
        dataset: dataset_args(dir.path()),
        field: "info".to_string(),
        threshold: 1.5,
    };
    assert!(run_missingness(&args).is_err());
}

#[test]
fn header_check_passes_only_when_every_field_is_described() {
    let dir = TempDir::new().unwrap();
    let complete = r#"{
        "info": {
            "allele_type": "Allele type",
            "n_alt_alleles": "Number of alternate alleles",
            "lcr": "Low complexity region",
            "segdup": {"Description": "Segmental duplication"},
            "qual_hist_bin_freq": "Site quality histogram"
        },
        "filter": {"AC0": "No high quality genotypes", "RF": "Random forest"}
    }"#;
    let mut args = HeaderArgs {
        dataset: dataset_args(dir.path()),
        header: write(dir.path(), "header.json", complete),
        entry_fields: Vec::new(),
        hists: vec!["qual_hist".to_string()],
    };
    assert!(run_header(&args).unwrap());

    let incomplete = complete.replace("\"RF\": \"Random forest\"", "\"RF\": \"\"");
    args.header = write(dir.path(), "incomplete.json", &incomplete);
    assert!(!run_header(&args).unwrap());
}
