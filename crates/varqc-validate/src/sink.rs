//! Report sinks.
//!
//! Check families never write to a global logger. They receive a
//! [`ReportSink`] for the duration of one run and emit report lines and
//! example-row tables into it. [`TracingSink`] forwards to `tracing`;
//! [`MemorySink`] keeps everything for inspection.

use varqc_model::DisplayLimits;

use crate::display::DisplayTable;

/// `tracing` target of every event emitted by [`TracingSink`].
pub const REPORT_TARGET: &str = "varqc::report";

/// Severity of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReportLevel {
    Info,
    Warn,
    Error,
}

/// One item of report output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Line { level: ReportLevel, text: String },
    Table(DisplayTable),
}

pub trait ReportSink {
    fn line(&mut self, level: ReportLevel, text: &str);

    fn table(&mut self, table: DisplayTable);

    fn info(&mut self, text: &str) {
        self.line(ReportLevel::Info, text);
    }

    fn warn(&mut self, text: &str) {
        self.line(ReportLevel::Warn, text);
    }

    fn error(&mut self, text: &str) {
        self.line(ReportLevel::Error, text);
    }
}

/// Forwards report output to `tracing` under the `varqc::report` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    limits: DisplayLimits,
}

impl TracingSink {
    pub fn new(limits: DisplayLimits) -> Self {
        Self { limits }
    }
}

impl ReportSink for TracingSink {
    fn line(&mut self, level: ReportLevel, text: &str) {
        match level {
            ReportLevel::Info => tracing::info!(target: REPORT_TARGET, "{text}"),
            ReportLevel::Warn => tracing::warn!(target: REPORT_TARGET, "{text}"),
            ReportLevel::Error => tracing::error!(target: REPORT_TARGET, "{text}"),
        }
    }

    fn table(&mut self, table: DisplayTable) {
        let rendered = table.render(self.limits);
        match &table.title {
            Some(title) => tracing::info!(target: REPORT_TARGET, "{title}\n{rendered}"),
            None => tracing::info!(target: REPORT_TARGET, "\n{rendered}"),
        }
    }
}

/// Collects report output in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<ReportEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReportEvent] {
        &self.events
    }

    /// Text of every line, in emission order.
    pub fn lines(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Line { text, .. } => Some(text.as_str()),
                ReportEvent::Table(_) => None,
            })
            .collect()
    }

    pub fn tables(&self) -> Vec<&DisplayTable> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Table(table) => Some(table),
                ReportEvent::Line { .. } => None,
            })
            .collect()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ReportSink for MemorySink {
    fn line(&mut self, level: ReportLevel, text: &str) {
        self.events.push(ReportEvent::Line {
            level,
            text: text.to_string(),
        });
    }

    fn table(&mut self, table: DisplayTable) {
        self.events.push(ReportEvent::Table(table));
    }
}
