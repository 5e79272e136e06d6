//! Dataset-level summaries: row counts and per-contig variant counts.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;
use varqc_model::values::{cell_string, cell_u64};
use varqc_model::{CONTIG_COLUMN, Dataset};

use crate::error::Result;
use crate::sink::ReportSink;

/// Result of [`summarize_variants`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub n_variants: u64,
    /// Variant count per contig in karyotypic order. Expected contigs with
    /// no variants are listed with a zero count.
    pub contigs: Vec<(String, u64)>,
    pub missing_contigs: Vec<String>,
    pub unexpected_contigs: Vec<String>,
}

impl VariantSummary {
    /// Contigs with at least one variant.
    pub fn found_contigs(&self) -> Vec<String> {
        self.contigs
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(contig, _)| contig.clone())
            .collect()
    }

    pub fn contig_check_passed(&self) -> bool {
        self.missing_contigs.is_empty() && self.unexpected_contigs.is_empty()
    }
}

/// Log the row counts of two datasets and return whether they agree.
pub fn compare_row_counts(left: &Dataset, right: &Dataset, sink: &mut dyn ReportSink) -> Result<bool> {
    let n_left = left.count()?;
    let n_right = right.count()?;
    sink.info(&format!(
        "{n_left} rows in left table; {n_right} rows in right table"
    ));
    Ok(n_left == n_right)
}

/// Variant count per observed contig, in karyotypic order.
pub fn collect_contigs(ds: &Dataset) -> Result<Vec<(String, u64)>> {
    let df = ds.group_by_aggregate(
        vec![col(CONTIG_COLUMN)],
        vec![len().cast(DataType::Int64).alias("n")],
    )?;
    let mut counts = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        counts.push((cell_string(&df, CONTIG_COLUMN, row)?, cell_u64(&df, "n", row)?));
    }
    counts.sort_by(|(a, _), (b, _)| contig_sort_key(a).cmp(&contig_sort_key(b)));
    Ok(counts)
}

/// Count variants, per contig, and compare the contigs found with
/// `expected_contigs` when given.
pub fn summarize_variants(
    ds: &Dataset,
    expected_contigs: Option<&[String]>,
    sink: &mut dyn ReportSink,
) -> Result<VariantSummary> {
    let mut contigs = collect_contigs(ds)?;
    let n_variants = contigs.iter().map(|(_, n)| n).sum();
    let observed: BTreeSet<String> = contigs.iter().map(|(contig, _)| contig.clone()).collect();

    if let Some(expected) = expected_contigs {
        for contig in expected.iter().filter(|contig| !observed.contains(*contig)) {
            contigs.push((contig.clone(), 0));
        }
        contigs.sort_by(|(a, _), (b, _)| contig_sort_key(a).cmp(&contig_sort_key(b)));
    }

    let mut summary = VariantSummary {
        n_variants,
        contigs,
        ..VariantSummary::default()
    };
    sink.info(&format!(
        "Dataset has {n_variants} variants distributed across the following contigs: {}",
        render_counts(&summary.contigs)
    ));

    for (contig, n) in &summary.contigs {
        if *n == 0 {
            sink.warn(&format!("{contig} has no variants called"));
        }
    }

    if let Some(expected) = expected_contigs.filter(|expected| !expected.is_empty()) {
        let found = summary.found_contigs();
        summary.missing_contigs = expected
            .iter()
            .filter(|contig| !found.contains(contig))
            .cloned()
            .collect();
        summary.unexpected_contigs = found
            .iter()
            .filter(|contig| !expected.contains(contig))
            .cloned()
            .collect();

        sink.info(&format!("Expected contigs: {}", render_list(expected)));
        sink.info(&format!("Found contigs: {}", render_list(&found)));
        if !summary.missing_contigs.is_empty() {
            sink.info(&format!(
                "FAILED contig check, the following contigs are missing: {}",
                render_list(&summary.missing_contigs)
            ));
        }
        if !summary.unexpected_contigs.is_empty() {
            sink.info(&format!(
                "FAILED contig check, the following contigs are unexpected: {}",
                render_list(&summary.unexpected_contigs)
            ));
        }
    }

    Ok(summary)
}

/// Autosomes numerically, then X, Y, mitochondria, then anything else by name.
fn contig_sort_key(contig: &str) -> (u8, u32, String) {
    let bare = contig.strip_prefix("chr").unwrap_or(contig);
    match bare {
        "X" => (1, 0, String::new()),
        "Y" => (2, 0, String::new()),
        "M" | "MT" => (3, 0, String::new()),
        _ => match bare.parse::<u32>() {
            Ok(n) => (0, n, String::new()),
            Err(_) => (4, 0, contig.to_string()),
        },
    }
}

fn render_counts(counts: &[(String, u64)]) -> String {
    let entries: Vec<String> = counts
        .iter()
        .map(|(contig, n)| format!("{contig}: {n}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

fn render_list(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contig_order_is_karyotypic() {
        let mut contigs = vec!["chrY", "chr10", "chrX", "chr2", "chrM", "chr1"];
        contigs.sort_by_key(|contig| contig_sort_key(contig));
        assert_eq!(contigs, vec!["chr1", "chr2", "chr10", "chrX", "chrY", "chrM"]);
    }
}
