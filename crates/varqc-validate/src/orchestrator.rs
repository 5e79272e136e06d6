//! Release validation: every check family, in a fixed order.
//!
//! Stages run sequentially against the same dataset. A stage that errors is
//! reported and recorded; the following stages still run.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use varqc_model::{Dataset, ValidationOptions};

use crate::checks::{
    FilterSummary, FilterSummaryConfig, VariantSummary, check_global_and_row_annot_lengths,
    check_raw_and_adj_callstats, check_sex_chr_metrics, collect_contigs, compare_subset_freqs,
    pprint_global_anns, sum_group_callstats, summarize_variant_filters, summarize_variants,
};
use crate::error::Result;
use crate::missingness::{
    MissingnessReport, check_array_struct_missingness, check_missingness_of_struct,
    compute_missingness, flatten_missingness_struct, report_missingness_fractions,
};
use crate::reporter::{CheckOutcome, ReportSettings};
use crate::sink::ReportSink;

/// One check family of the release validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Globals,
    GlobalLengths,
    Summary,
    Filters,
    RawAdj,
    SubsetFreq,
    SumGroups,
    SexChr,
    Missingness,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 9] = [
        Stage::Globals,
        Stage::GlobalLengths,
        Stage::Summary,
        Stage::Filters,
        Stage::RawAdj,
        Stage::SubsetFreq,
        Stage::SumGroups,
        Stage::SexChr,
        Stage::Missingness,
    ];

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Globals => "globals",
            Self::GlobalLengths => "global-lengths",
            Self::Summary => "summary",
            Self::Filters => "filters",
            Self::RawAdj => "raw-adj",
            Self::SubsetFreq => "subset-freq",
            Self::SumGroups => "sum-groups",
            Self::SexChr => "sex-chr",
            Self::Missingness => "missingness",
        }
    }

    /// Report line opening the stage.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Globals => "GLOBALS OF INPUT TABLE:",
            Self::GlobalLengths => "COMPARE GLOBAL ANNOTATIONS' LENGTHS TO ROW ANNOTATIONS:",
            Self::Summary => "BASIC SUMMARY OF INPUT TABLE:",
            Self::Filters => "VARIANT FILTER SUMMARIES:",
            Self::RawAdj => "RAW AND ADJ CHECKS:",
            Self::SubsetFreq => "SUBSET FREQUENCY CHECKS:",
            Self::SumGroups => "CALLSET ANNOTATIONS TO SUM GROUP CHECKS:",
            Self::SexChr => "SEX CHROMOSOME ANNOTATION CHECKS:",
            Self::Missingness => "MISSINGNESS CHECKS:",
        }
    }

    /// Whether `options` enable this stage.
    pub fn enabled(self, options: &ValidationOptions) -> bool {
        let stages = &options.stages;
        match self {
            Self::Globals => stages.pprint_globals,
            Self::GlobalLengths => !options.row_to_globals_check.is_empty(),
            Self::Summary => stages.summarize_variants,
            Self::Filters => stages.filters,
            Self::RawAdj => stages.raw_adj,
            Self::SubsetFreq => stages.subset_freq,
            Self::SumGroups => stages.samples_sum,
            Self::SexChr => stages.sex_chr,
            Self::Missingness => stages.missingness,
        }
    }

    /// Turn this stage off in `options`.
    pub fn disable(self, options: &mut ValidationOptions) {
        let stages = &mut options.stages;
        match self {
            Self::Globals => stages.pprint_globals = false,
            Self::GlobalLengths => options.row_to_globals_check.clear(),
            Self::Summary => stages.summarize_variants = false,
            Self::Filters => stages.filters = false,
            Self::RawAdj => stages.raw_adj = false,
            Self::SubsetFreq => stages.subset_freq = false,
            Self::SumGroups => stages.samples_sum = false,
            Self::SexChr => stages.sex_chr = false,
            Self::Missingness => stages.missingness = false,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|stage| stage.name()).collect();
                format!("unknown stage '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// What one stage produced.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub outcomes: Vec<CheckOutcome>,
    /// Set when the stage stopped on an error.
    pub error: Option<String>,
    pub duration_ms: u128,
}

impl StageReport {
    pub fn n_failed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.passed()).count()
    }
}

/// Everything a release validation produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub stages: Vec<StageReport>,
    pub variant_summary: Option<VariantSummary>,
    pub filter_summary: Option<FilterSummary>,
    pub missingness: Vec<MissingnessReport>,
}

impl ValidationSummary {
    pub fn outcomes(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.stages.iter().flat_map(|stage| stage.outcomes.iter())
    }

    pub fn n_checks(&self) -> usize {
        self.outcomes().count()
    }

    pub fn n_failed(&self) -> usize {
        self.outcomes().filter(|outcome| !outcome.passed()).count()
    }

    pub fn errored_stages(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter().filter(|stage| stage.error.is_some())
    }

    /// Whether any check failed or any stage errored.
    pub fn has_findings(&self) -> bool {
        self.n_failed() > 0 || self.errored_stages().next().is_some()
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }
}

/// Run every enabled check family over a release dataset.
///
/// Options are validated up front; after that, errors raised inside a stage
/// are reported to `sink` and recorded in the summary rather than returned.
pub fn validate_release(
    ds: &Dataset,
    options: &ValidationOptions,
    sink: &mut dyn ReportSink,
) -> Result<ValidationSummary> {
    options.validate()?;
    let settings = ReportSettings::from_options(options);
    let naming = options.naming();
    let mut summary = ValidationSummary::default();
    let run_start = Instant::now();

    for stage in Stage::ALL {
        if !stage.enabled(options) {
            debug!(stage = %stage, "stage disabled");
            continue;
        }
        sink.info(stage.heading());
        let start = Instant::now();
        let result = info_span!("stage", stage = %stage).in_scope(|| -> Result<Vec<CheckOutcome>> {
            match stage {
                Stage::Globals => {
                    pprint_global_anns(ds, sink);
                    Ok(Vec::new())
                }
                Stage::GlobalLengths => check_global_and_row_annot_lengths(
                    ds,
                    &options.row_to_globals_check,
                    options.check_all_rows,
                    sink,
                ),
                Stage::Summary => {
                    let variants =
                        summarize_variants(ds, options.expected_contigs.as_deref(), sink)?;
                    let mut outcomes = Vec::new();
                    if options.expected_contigs.is_some() {
                        let n_off = variants.missing_contigs.len() + variants.unexpected_contigs.len();
                        outcomes.push(CheckOutcome::new(
                            "expected contigs",
                            u64::try_from(n_off).unwrap_or(u64::MAX),
                            !variants.contig_check_passed(),
                        ));
                    }
                    summary.variant_summary = Some(variants);
                    Ok(outcomes)
                }
                Stage::Filters => {
                    let config = FilterSummaryConfig {
                        variant_filter_field: &options.variant_filter_field,
                        problematic_regions: &options.problematic_regions,
                        single_filter_count: options.single_filter_count,
                        site_gt_checks: &options.site_gt_checks,
                        extra_filter_checks: &options.extra_filter_checks,
                    };
                    summary.filter_summary = Some(summarize_variant_filters(ds, &config, sink)?);
                    Ok(Vec::new())
                }
                Stage::RawAdj => {
                    check_raw_and_adj_callstats(ds, &options.subsets, &naming, &settings, sink)
                }
                Stage::SubsetFreq => compare_subset_freqs(
                    ds,
                    &options.subsets,
                    &options.sum_metrics,
                    &naming,
                    &settings,
                    sink,
                ),
                Stage::SumGroups => sum_group_callstats(ds, options, &settings, sink),
                Stage::SexChr => {
                    let contigs = match &summary.variant_summary {
                        Some(variants) => variants.found_contigs(),
                        None => collect_contigs(ds)?
                            .into_iter()
                            .map(|(contig, _)| contig)
                            .collect(),
                    };
                    check_sex_chr_metrics(
                        ds,
                        &ds.info_fields()?,
                        &contigs,
                        &options.delimiter,
                        options.reference_genome,
                        &settings,
                        sink,
                    )
                }
                Stage::Missingness => {
                    let reports = run_missingness(ds, options, sink)?;
                    let outcomes = reports
                        .iter()
                        .flat_map(|report| {
                            report.outcomes.iter().map(move |outcome| {
                                CheckOutcome::new(
                                    format!(
                                        "{} missingness <= {:.2}",
                                        outcome.metric, report.threshold
                                    ),
                                    outcome.n_missing.unwrap_or_default(),
                                    !outcome.passed,
                                )
                            })
                        })
                        .collect();
                    summary.missingness = reports;
                    Ok(outcomes)
                }
            }
        });

        let duration_ms = start.elapsed().as_millis();
        let report = match result {
            Ok(outcomes) => StageReport {
                stage,
                outcomes,
                error: None,
                duration_ms,
            },
            Err(err) => {
                warn!(stage = %stage, error = %err, "stage aborted");
                sink.error(&format!("{} stage failed: {err}", stage.name()));
                StageReport {
                    stage,
                    outcomes: Vec::new(),
                    error: Some(err.to_string()),
                    duration_ms,
                }
            }
        };
        info!(
            stage = %stage,
            checks = report.outcomes.len(),
            failed = report.n_failed(),
            duration_ms,
            "stage complete"
        );
        summary.stages.push(report);
    }

    sink.info("VALIDITY CHECKS COMPLETE");
    info!(
        checks = summary.n_checks(),
        failed = summary.n_failed(),
        duration_ms = run_start.elapsed().as_millis(),
        "validation complete"
    );
    Ok(summary)
}

/// Flat missingness over all row annotations, then the per-leaf walk of the
/// info struct, then the unfurled arrays of records when enabled.
fn run_missingness(
    ds: &Dataset,
    options: &ValidationOptions,
    sink: &mut dyn ReportSink,
) -> Result<Vec<MissingnessReport>> {
    let catalog = ds.catalog()?;
    let info_root = ds.info_root();
    let info_metrics: Vec<String> = catalog.info_names().map(str::to_string).collect();
    let non_info_metrics: Vec<String> = catalog
        .row_names()
        .filter(|name| *name != info_root)
        .map(str::to_string)
        .collect();
    let n_sites = ds.count()?;

    let mut reports = vec![compute_missingness(
        ds,
        &info_metrics,
        &non_info_metrics,
        n_sites,
        options.missingness_threshold,
        sink,
    )?];

    if catalog.has_row(info_root) {
        sink.info(&format!("Missingness of every field within {info_root}:"));
        let tree = check_missingness_of_struct(ds, info_root)?;
        let fractions = flatten_missingness_struct(ds, &tree)?;
        reports.push(report_missingness_fractions(
            fractions,
            options.missingness_threshold,
            sink,
        ));
    }

    if options.stages.array_struct_missingness {
        sink.info("Missingness of unfurled array annotations:");
        let fractions = check_array_struct_missingness(ds, &options.indexed_array_annotations)?;
        reports.push(report_missingness_fractions(
            fractions,
            options.missingness_threshold,
            sink,
        ));
    }

    Ok(reports)
}
