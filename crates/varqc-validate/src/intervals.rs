//! Per-interval counts of VEP-annotated variants.
//!
//! Variants are matched to every interval (typically a gene) containing
//! them, then counted per gene, overall and restricted to variants with a
//! protein-coding transcript consequence.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use tracing::info;
use varqc_model::values::cell_string;
use varqc_model::{CONTIG_COLUMN, Dataset, POSITION_COLUMN};

use crate::error::{Result, ValidateError};
use crate::expr::{count_where, list_struct_field_contains};
use crate::sink::ReportSink;

pub const GENE_ID_COLUMN: &str = "gene_stable_ID";
pub const START_COLUMN: &str = "start";
pub const END_COLUMN: &str = "end";
pub const ALL_VARIANTS: &str = "all_variants";
pub const PCG_VARIANTS: &str = "variants_in_pcg";

const IN_PCG: &str = "in_pcg";

/// Closed genomic intervals keyed by `contig`, `start` and `end`, each
/// labelled with a `gene_stable_ID`.
#[derive(Debug, Clone)]
pub struct IntervalIndex {
    intervals: DataFrame,
}

impl IntervalIndex {
    pub fn new(intervals: DataFrame) -> Result<Self> {
        for column in [CONTIG_COLUMN, START_COLUMN, END_COLUMN, GENE_ID_COLUMN] {
            if intervals.column(column).is_err() {
                return Err(ValidateError::FieldNotFound {
                    field: column.to_string(),
                    scope: "interval table".to_string(),
                });
            }
        }
        Ok(Self { intervals })
    }

    pub fn len(&self) -> usize {
        self.intervals.height()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.height() == 0
    }

    pub fn frame(&self) -> &DataFrame {
        &self.intervals
    }

    /// Pair every row of `rows` with every interval containing its locus.
    ///
    /// Rows outside all intervals are dropped; rows inside several appear
    /// once per interval. The interval columns are appended.
    pub fn matches(&self, rows: LazyFrame) -> LazyFrame {
        let position = col(POSITION_COLUMN);
        rows.join(
            self.intervals.clone().lazy(),
            [col(CONTIG_COLUMN)],
            [col(CONTIG_COLUMN)],
            JoinArgs::new(JoinType::Inner),
        )
        .filter(
            position
                .clone()
                .gt_eq(col(START_COLUMN))
                .and(position.lt_eq(col(END_COLUMN))),
        )
    }
}

/// Result of [`count_vep_annotated_variants_per_interval`].
#[derive(Debug, Clone)]
pub struct IntervalCounts {
    /// The intervals with `all_variants` and `variants_in_pcg` appended;
    /// both are missing for intervals without any variant.
    pub table: Dataset,
    /// Genes with no protein-coding variant.
    pub na_genes: Vec<String>,
    /// Genes where only some variants are protein-coding.
    pub partial_pcg_genes: Vec<String>,
}

/// Summary of [`IntervalCounts`] for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalCountSummary {
    pub n_intervals: usize,
    pub na_genes: Vec<String>,
    pub partial_pcg_genes: Vec<String>,
}

impl IntervalCounts {
    pub fn summary(&self) -> Result<IntervalCountSummary> {
        Ok(IntervalCountSummary {
            n_intervals: self.table.count()?,
            na_genes: self.na_genes.clone(),
            partial_pcg_genes: self.partial_pcg_genes.clone(),
        })
    }
}

/// Count variants and protein-coding variants of `vep` in each interval.
///
/// `vep` needs a `vep` struct row field whose `transcript_consequences`
/// list holds records with a `biotype`. The counted table is written to
/// `checkpoint` as parquet when given, otherwise kept in memory.
pub fn count_vep_annotated_variants_per_interval(
    vep: &Dataset,
    intervals: &IntervalIndex,
    checkpoint: Option<&Path>,
    sink: &mut dyn ReportSink,
) -> Result<IntervalCounts> {
    sink.info("Counting the number of total variants and protein-coding variants in each interval...");

    let consequences = vep
        .catalog()?
        .row("vep")?
        .expr()
        .struct_()
        .field_by_name("transcript_consequences");
    let variants = vep.lazy().select([
        col(CONTIG_COLUMN),
        col(POSITION_COLUMN),
        list_struct_field_contains(consequences, "biotype", "protein_coding").alias(IN_PCG),
    ]);

    let counts = intervals
        .matches(variants)
        .group_by([col(GENE_ID_COLUMN)])
        .agg([
            len().cast(DataType::Int64).alias(ALL_VARIANTS),
            count_where(col(IN_PCG)).alias(PCG_VARIANTS),
        ]);
    let annotated = intervals.frame().clone().lazy().join(
        counts,
        [col(GENE_ID_COLUMN)],
        [col(GENE_ID_COLUMN)],
        JoinArgs::new(JoinType::Left),
    );

    let table = vep.with_rows(annotated);
    let table = match checkpoint {
        Some(path) => {
            info!(path = %path.display(), "checkpointing the counts per interval");
            table.checkpoint(path)?
        }
        None => table.persist()?,
    };

    sink.info("Genes without variants annotated: ");
    let all = col(ALL_VARIANTS);
    let pcg = col(PCG_VARIANTS);
    let na_genes = collect_genes(&table, pcg.clone().is_null().or(pcg.clone().eq(lit(0))))?;
    let partial_pcg_genes = collect_genes(
        &table,
        all.clone()
            .neq(lit(0))
            .and(pcg.clone().neq(lit(0)))
            .and(all.neq(pcg)),
    )?;

    sink.info(&format!(
        "{} gene(s) have no variants annotated as protein-coding in Biotype. It is likely \
         these genes are not covered by the variants in 'vep_ht'. These genes are: [{}]",
        na_genes.len(),
        na_genes.join(", ")
    ));
    sink.info(&format!(
        "{} gene(s) have a subset of variants annotated as protein-coding biotype in their \
         defined intervals",
        partial_pcg_genes.len()
    ));

    Ok(IntervalCounts {
        table,
        na_genes,
        partial_pcg_genes,
    })
}

/// Distinct gene IDs of intervals matching `predicate`, sorted.
fn collect_genes(table: &Dataset, predicate: Expr) -> Result<Vec<String>> {
    let df = table
        .filter(predicate.fill_null(lit(false)))
        .select(vec![col(GENE_ID_COLUMN)])
        .collect()?;
    let mut genes = BTreeSet::new();
    for row in 0..df.height() {
        genes.insert(cell_string(&df, GENE_ID_COLUMN, row)?);
    }
    Ok(genes.into_iter().collect())
}
