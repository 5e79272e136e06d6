//! Example-row tables attached to reports.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use polars::prelude::DataFrame;
use varqc_model::DisplayLimits;
use varqc_model::values::any_to_string;

use crate::error::Result;

/// A small, already-materialized table of rows to show a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTable {
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    /// Render every cell of `df` as text.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut rows = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let mut row = Vec::with_capacity(columns.len());
            for column in df.get_columns() {
                row.push(any_to_string(column.get(idx)?));
            }
            rows.push(row);
        }
        Ok(Self {
            title: None,
            columns,
            rows,
        })
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a box-drawn table of at most `n_rows` rows and the first
    /// `n_cols` columns, noting how much was left out.
    pub fn render(&self, limits: DisplayLimits) -> String {
        let n_cols = limits.n_cols.min(self.columns.len());
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(self.columns.iter().take(n_cols).map(|c| header_cell(c)));
        for row in self.rows.iter().take(limits.n_rows) {
            table.add_row(row.iter().take(n_cols).map(Cell::new));
        }
        let mut out = table.to_string();
        if self.rows.len() > limits.n_rows {
            out.push_str(&format!(
                "\nshowing top {} of {} rows",
                limits.n_rows,
                self.rows.len()
            ));
        }
        let omitted = self.columns.len() - n_cols;
        if omitted > 0 {
            out.push_str(&format!(
                "\n{omitted} of {} columns not shown",
                self.columns.len()
            ));
        }
        out
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
