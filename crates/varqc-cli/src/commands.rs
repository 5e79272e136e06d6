use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, info_span, warn};

use varqc_ingest::{DatasetSource, load_dataset, read_header_dict};
use varqc_model::labels::HISTS;
use varqc_model::Dataset;
use varqc_validate::checks::vcf_field_check;
use varqc_validate::missingness::report_missingness_fractions;
use varqc_validate::{
    MissingnessReport, TracingSink, ValidationSummary, check_missingness_of_struct,
    flatten_missingness_struct, validate_release,
};

use crate::cli::{DatasetArgs, HeaderArgs, MissingnessArgs, StagesArgs, ValidateArgs};
use crate::config::{OptionOverrides, apply_overrides, load_options};
use crate::summary::stages_table;

/// Outcome of `varqc validate`.
#[derive(Debug, Serialize)]
pub struct ValidateResult {
    pub rows: PathBuf,
    pub summary: ValidationSummary,
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    generated_at: String,
    #[serde(flatten)]
    result: &'a ValidateResult,
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let overrides = OptionOverrides {
        skip: args.skip.clone(),
        verbose_checks: args.verbose_checks,
        missingness_threshold: args.missingness_threshold,
        expected_contigs: args.expected_contigs.clone(),
        array_struct_missingness: args.array_struct_missingness,
    };
    let options = apply_overrides(load_options(args.config.as_deref())?, &overrides);
    let ds = open_dataset(&args.dataset)?;

    let span = info_span!("validate", rows = %args.dataset.rows.display());
    let start = Instant::now();
    let summary = span.in_scope(|| {
        let mut sink = TracingSink::new(options.display);
        validate_release(&ds, &options, &mut sink)
    })
    .context("validate release")?;
    info!(
        duration_ms = start.elapsed().as_millis(),
        checks = summary.n_checks(),
        failed = summary.n_failed(),
        "validation complete"
    );
    for stage in summary.errored_stages() {
        warn!(stage = %stage.stage, "stage did not complete");
    }

    let result = ValidateResult {
        rows: args.dataset.rows.clone(),
        summary,
    };
    if let Some(path) = &args.summary_json {
        write_summary_json(path, &result)?;
    }
    Ok(result)
}

pub fn run_missingness(args: &MissingnessArgs) -> Result<MissingnessReport> {
    if !(0.0..=1.0).contains(&args.threshold) {
        bail!("missingness threshold must be within [0, 1], got {}", args.threshold);
    }
    let ds = open_dataset(&args.dataset)?;
    let span = info_span!("missingness", field = %args.field);
    let _guard = span.enter();
    let start = Instant::now();
    let tree = check_missingness_of_struct(&ds, &args.field)
        .with_context(|| format!("walk field {}", args.field))?;
    let fractions = flatten_missingness_struct(&ds, &tree).context("compute missingness")?;
    let report = report_missingness_fractions(
        fractions,
        args.threshold,
        &mut TracingSink::default(),
    );
    info!(
        duration_ms = start.elapsed().as_millis(),
        fields = report.outcomes.len(),
        failed = report.n_failed(),
        "missingness complete"
    );
    Ok(report)
}

/// Returns whether every exported field is described.
pub fn run_header(args: &HeaderArgs) -> Result<bool> {
    let ds = open_dataset(&args.dataset)?;
    let header = read_header_dict(&args.header)
        .with_context(|| format!("read header {}", args.header.display()))?;
    let row_annotations = ds.info_fields().context("list info fields")?;
    let hists: Vec<String> = if args.hists.is_empty() {
        HISTS.iter().map(|hist| (*hist).to_string()).collect()
    } else {
        args.hists.clone()
    };
    let entries = (!args.entry_fields.is_empty()).then_some(args.entry_fields.as_slice());

    let _guard = info_span!("header", header = %args.header.display()).entered();
    let passed = vcf_field_check(
        &ds,
        &header,
        &row_annotations,
        entries,
        hists.as_slice(),
        &mut TracingSink::default(),
    )
    .context("check header")?;
    info!(passed, info_fields = row_annotations.len(), "header check complete");
    Ok(passed)
}

pub fn run_stages(args: &StagesArgs) -> Result<()> {
    let options = load_options(args.config.as_deref())?;
    println!("{}", stages_table(&options));
    Ok(())
}

fn open_dataset(args: &DatasetArgs) -> Result<Dataset> {
    let mut source = DatasetSource::new(&args.rows).with_set_fields(args.set_fields.clone());
    if let Some(globals) = &args.globals {
        source = source.with_globals(globals);
    }
    load_dataset(&source).with_context(|| format!("load dataset {}", args.rows.display()))
}

fn write_summary_json(path: &Path, result: &ValidateResult) -> Result<()> {
    let document = SummaryDocument {
        generated_at: chrono::Utc::now().to_rfc3339(),
        result,
    };
    let json = serde_json::to_string_pretty(&document).context("serialize summary")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote summary");
    Ok(())
}
