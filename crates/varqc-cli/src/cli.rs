//! CLI argument definitions for the release validator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;
use varqc_validate::Stage;

#[derive(Parser)]
#[command(
    name = "varqc",
    version,
    about = "Validity checks for genomic variant release datasets",
    long_about = "Run validity checks over a variant release dataset.\n\n\
                  Rows are read from parquet, newline-delimited JSON or CSV; \
                  dataset-wide globals come from a JSON sidecar."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write diagnostics to a file instead of stderr. The report still goes to stdout.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Lowest severity of report lines printed to stdout.
    #[arg(
        long = "report-level",
        value_enum,
        default_value = "info",
        global = true
    )]
    pub report_level: ReportLevelArg,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run every enabled check family over a release dataset.
    Validate(ValidateArgs),

    /// Report the missingness of every leaf of a struct field.
    Missingness(MissingnessArgs),

    /// Check that the dataset's fields are described in a VCF header dictionary.
    Header(HeaderArgs),

    /// List the check stages in execution order.
    Stages(StagesArgs),
}

/// Arguments shared by every command that loads a dataset.
#[derive(Parser)]
pub struct DatasetArgs {
    /// Row table (.parquet, .ndjson, .jsonl or .csv).
    #[arg(value_name = "ROWS")]
    pub rows: PathBuf,

    /// JSON object of global annotations.
    #[arg(long = "globals", value_name = "FILE")]
    pub globals: Option<PathBuf>,

    /// Dotted path of a list field holding a set (repeatable).
    #[arg(long = "set-field", value_name = "PATH")]
    pub set_fields: Vec<String>,
}

#[derive(Parser)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// TOML file of validation options.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Stage to skip (repeatable).
    #[arg(long = "skip", value_name = "STAGE")]
    pub skip: Vec<Stage>,

    /// Show example rows for passing checks too.
    #[arg(long = "verbose-checks")]
    pub verbose_checks: bool,

    /// Upper bound on the allowed fraction of missing values.
    #[arg(long = "missingness-threshold", value_name = "F")]
    pub missingness_threshold: Option<f64>,

    /// Contig expected in the dataset (repeatable).
    #[arg(long = "expected-contig", value_name = "CONTIG")]
    pub expected_contigs: Vec<String>,

    /// Also check missingness of indexed arrays of records.
    #[arg(long = "array-struct-missingness")]
    pub array_struct_missingness: bool,

    /// Write the run summary as JSON.
    #[arg(long = "summary-json", value_name = "PATH")]
    pub summary_json: Option<PathBuf>,

    /// Exit with status 1 when any check failed or any stage errored.
    #[arg(long = "fail-on-findings")]
    pub fail_on_findings: bool,
}

#[derive(Parser)]
pub struct MissingnessArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Struct row field to walk.
    #[arg(long = "field", default_value = "info")]
    pub field: String,

    /// Fractions above this are flagged.
    #[arg(long = "threshold", default_value_t = 0.5)]
    pub threshold: f64,
}

#[derive(Parser)]
pub struct HeaderArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// JSON header dictionary: section -> field -> description.
    #[arg(long = "header", value_name = "FILE")]
    pub header: PathBuf,

    /// Entry (FORMAT) field to check (repeatable).
    #[arg(long = "entry-field", value_name = "FIELD")]
    pub entry_fields: Vec<String>,

    /// Histogram exported alongside the info fields (repeatable; defaults to
    /// the release histograms).
    #[arg(long = "hist", value_name = "NAME")]
    pub hists: Vec<String>,
}

#[derive(Parser)]
pub struct StagesArgs {
    /// Show which stages this TOML file enables.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Report line severities, or `off` to print only the summary.
#[derive(Clone, Copy, ValueEnum)]
pub enum ReportLevelArg {
    Off,
    Error,
    Warn,
    Info,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
