//! Logging for the validator, built on `tracing-subscriber`.
//!
//! Two layers share one registry:
//!
//! - the **report** layer takes only events under [`REPORT_TARGET`], which is
//!   where [`TracingSink`](varqc_validate::TracingSink) puts report lines and
//!   example-row tables. It writes them undecorated to stdout and has its own
//!   level, so `-q` quiets diagnostics without hiding findings.
//! - the **diagnostics** layer takes everything else (stage progress, timings,
//!   absent optional fields) and writes to stderr or `--log-file`.
//!
//! With [`LogFormat::Json`] both layers emit JSON lines instead.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::{FilterExt, Targets, filter_fn};
use tracing_subscriber::fmt::format::{self, FmtSpan, FormatEvent, FormatFields};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self as tfmt, FmtContext, MakeWriter};
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use varqc_validate::REPORT_TARGET;

/// Crates whose diagnostics follow the configured level; everything else
/// stays at `warn`.
const OWN_TARGETS: [&str; 4] = ["varqc_cli", "varqc_ingest", "varqc_model", "varqc_validate"];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for diagnostics from the workspace crates.
    pub level_filter: LevelFilter,
    /// Level for report lines. `OFF` silences the report.
    pub report_level: LevelFilter,
    /// Let `RUST_LOG` replace the diagnostics filter.
    pub use_env_filter: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Append diagnostics to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::INFO,
            report_level: LevelFilter::INFO,
            use_env_filter: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
        }
    }
}

impl LogConfig {
    #[must_use]
    pub fn with_level(mut self, level_filter: LevelFilter) -> Self {
        self.level_filter = level_filter;
        self
    }

    #[must_use]
    pub fn with_report_level(mut self, report_level: LevelFilter) -> Self {
        self.report_level = report_level;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Diagnostics filter directives, ignoring `RUST_LOG`.
    pub fn directives(&self) -> String {
        let level = self.level_filter.to_string().to_lowercase();
        let mut directives = vec!["warn".to_string()];
        directives.extend(OWN_TARGETS.iter().map(|target| format!("{target}={level}")));
        directives.join(",")
    }
}

/// Install the global subscriber: report to stdout, diagnostics to stderr
/// or the configured log file.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    let diagnostics = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::stderr),
    };
    build_subscriber(config, diagnostics, io::stdout).init();
    Ok(())
}

/// Subscriber with the report and diagnostics layers over the given writers.
pub fn build_subscriber<D, R>(
    config: &LogConfig,
    diagnostics: D,
    report: R,
) -> impl Subscriber + Send + Sync + 'static
where
    D: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    R: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry().with(vec![
        diagnostics_layer(config, diagnostics),
        report_layer(config, report),
    ])
}

fn diagnostics_layer<W>(config: &LogConfig, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env = match EnvFilter::try_from_default_env() {
        Ok(filter) if config.use_env_filter => filter,
        _ => EnvFilter::new(config.directives()),
    };
    let filter = env.and(filter_fn(|meta| meta.target() != REPORT_TARGET));

    match config.format {
        LogFormat::Json => tfmt::layer()
            .json()
            .with_writer(writer)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tfmt::layer()
            .compact()
            .without_time()
            .with_target(false)
            .with_ansi(config.with_ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => tfmt::layer()
            .without_time()
            .with_target(false)
            .with_ansi(config.with_ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

fn report_layer<W>(config: &LogConfig, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = Targets::new().with_target(REPORT_TARGET, config.report_level);
    match config.format {
        LogFormat::Json => tfmt::layer()
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact | LogFormat::Pretty => tfmt::layer()
            .event_format(ReportLine)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

/// Writes only the event's fields, so a report line reads as plain text.
struct ReportLine;

impl<S, N> FormatEvent<S, N> for ReportLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use varqc_validate::{ReportSink, TracingSink};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn run(config: LogConfig, emit: impl FnOnce()) -> (String, String) {
        let diagnostics = Captured::default();
        let report = Captured::default();
        let config = LogConfig {
            use_env_filter: false,
            with_ansi: false,
            ..config
        };
        let subscriber = build_subscriber(&config, diagnostics.clone(), report.clone());
        tracing::subscriber::with_default(subscriber, emit);
        (diagnostics.contents(), report.contents())
    }

    #[test]
    fn test_directives_cover_workspace_crates() {
        let config = LogConfig::default().with_level(LevelFilter::DEBUG);
        assert_eq!(
            config.directives(),
            "warn,varqc_cli=debug,varqc_ingest=debug,varqc_model=debug,varqc_validate=debug"
        );
    }

    #[test]
    fn test_report_lines_are_written_plain_and_apart() {
        let (diagnostics, report) = run(LogConfig::default(), || {
            let mut sink = TracingSink::default();
            sink.info("PASSED AC-raw > 0 check");
            sink.warn("nonpar is not in table's info field");
            tracing::info!(target: "varqc_validate::orchestrator", stage = "summary", "stage complete");
        });
        assert_eq!(
            report,
            "PASSED AC-raw > 0 check\nnonpar is not in table's info field\n"
        );
        assert!(diagnostics.contains("stage complete"));
        assert!(!diagnostics.contains("PASSED"));
    }

    #[test]
    fn test_quiet_diagnostics_keep_report() {
        let config = LogConfig::default().with_level(LevelFilter::WARN);
        let (diagnostics, report) = run(config, || {
            TracingSink::default().info("Found 2 sites that fail AC-adj <= AN-adj check:");
            tracing::info!(target: "varqc_validate::orchestrator", "stage complete");
        });
        assert!(diagnostics.is_empty());
        assert_eq!(report, "Found 2 sites that fail AC-adj <= AN-adj check:\n");
    }

    #[test]
    fn test_report_level_filters_report() {
        let config = LogConfig::default().with_report_level(LevelFilter::WARN);
        let (_, report) = run(config, || {
            let mut sink = TracingSink::default();
            sink.info("PASSED AC-raw > 0 check");
            sink.error("freq_meta is not in the globals");
        });
        assert_eq!(report, "freq_meta is not in the globals\n");

        let config = LogConfig::default().with_report_level(LevelFilter::OFF);
        let (_, report) = run(config, || TracingSink::default().error("silenced"));
        assert!(report.is_empty());
    }

    #[test]
    fn test_json_report_keeps_target() {
        let config = LogConfig::default().with_format(LogFormat::Json);
        let (_, report) = run(config, || TracingSink::default().info("PASSED AC-raw > 0 check"));
        let line: serde_json::Value = serde_json::from_str(report.trim()).unwrap();
        assert_eq!(line["target"], REPORT_TARGET);
        assert_eq!(line["fields"]["message"], "PASSED AC-raw > 0 check");
    }
}
