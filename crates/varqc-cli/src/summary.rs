use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use varqc_model::ValidationOptions;
use varqc_validate::{CheckOutcome, MissingnessReport, Stage, StageReport, ValidationSummary};

use crate::commands::ValidateResult;

pub fn print_summary(result: &ValidateResult) {
    let summary = &result.summary;
    println!();
    println!("Dataset: {}", result.rows.display());
    if let Some(variants) = &summary.variant_summary {
        println!("Variants: {}", variants.n_variants);
    }
    println!(
        "Checks: {} run, {} failed",
        summary.n_checks(),
        summary.n_failed()
    );
    println!("{}", stage_table(summary));

    if summary.n_failed() > 0 {
        println!();
        println!("Failed checks:");
        println!("{}", failed_check_table(summary));
    }

    for stage in summary.errored_stages() {
        if let Some(error) = &stage.error {
            eprintln!("{}: {error}", stage.stage);
        }
    }

    for report in &summary.missingness {
        if report.n_failed() > 0 {
            println!();
            println!(
                "Missingness above {:.2}: {} field(s)",
                report.threshold,
                report.n_failed()
            );
            println!("{}", missingness_table(report, true));
        }
    }
}

/// One row per stage that ran.
pub fn stage_table(summary: &ValidationSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Checks"),
        header_cell("Failed"),
        header_cell("Time (ms)"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for stage in &summary.stages {
        table.add_row(vec![
            Cell::new(stage.stage.name())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            count_cell(stage.outcomes.len(), Color::Reset),
            count_cell(stage.n_failed(), Color::Red),
            dim_cell(stage.duration_ms),
            stage_status_cell(stage),
        ]);
    }
    table
}

/// Failing checks with their counts, grouped by stage.
pub fn failed_check_table(summary: &ValidationSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Check"),
        header_cell("Failing"),
        header_cell("Total"),
        header_cell("Percent"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for stage in &summary.stages {
        for outcome in stage.outcomes.iter().filter(|outcome| !outcome.passed()) {
            table.add_row(outcome_row(stage.stage, outcome));
        }
    }
    table
}

/// Missingness fractions; with `failed_only`, just the fields above the
/// threshold.
pub fn missingness_table(report: &MissingnessReport, failed_only: bool) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Missing"),
        header_cell("Fraction"),
        header_cell("Status"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for outcome in report
        .outcomes
        .iter()
        .filter(|outcome| !failed_only || !outcome.passed)
    {
        let missing = match outcome.n_missing {
            Some(n) => Cell::new(n),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&outcome.metric),
            missing,
            Cell::new(format!("{:.4}", outcome.fraction)),
            status_cell(outcome.passed),
        ]);
    }
    table
}

/// Stages in execution order with whether `options` enable them.
pub fn stages_table(options: &ValidationOptions) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Stage"),
        header_cell("Enabled"),
        header_cell("Heading"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for stage in Stage::ALL {
        let enabled = if stage.enabled(options) {
            Cell::new("on").fg(Color::Green)
        } else {
            dim_cell("off")
        };
        table.add_row(vec![Cell::new(stage.name()), enabled, Cell::new(stage.heading())]);
    }
    table
}

fn outcome_row(stage: Stage, outcome: &CheckOutcome) -> Vec<Cell> {
    let total = match outcome.n_total {
        Some(total) => Cell::new(total),
        None => dim_cell("-"),
    };
    let percent = match outcome.fail_fraction() {
        Some(fraction) => Cell::new(format!("{:.2} %", 100.0 * fraction)),
        None => dim_cell("-"),
    };
    vec![
        dim_cell(stage.name()),
        Cell::new(&outcome.description),
        Cell::new(outcome.n_fail)
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        total,
        percent,
    ]
}

fn stage_status_cell(stage: &StageReport) -> Cell {
    if stage.error.is_some() {
        Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    } else {
        status_cell(stage.n_failed() == 0)
    }
}

fn status_cell(passed: bool) -> Cell {
    if passed {
        Cell::new("PASS").fg(Color::Green)
    } else {
        Cell::new("FAIL")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
