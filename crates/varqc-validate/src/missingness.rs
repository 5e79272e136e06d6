//! Missingness analysis.
//!
//! Three views of how much of a dataset is absent:
//!
//! - [`compute_missingness`]: flat per-field missing counts for info fields
//!   and top-level row fields, checked against a threshold.
//! - [`check_missingness_of_struct`]: a recursive walk of a nested record
//!   producing one missing-fraction aggregate per leaf. Sequence and set
//!   leaves count as missing when absent, empty, or holding only missing
//!   elements.
//! - [`check_array_struct_missingness`]: arrays of records are unfurled
//!   into one flat field per (category, record field) using a global index
//!   dictionary, then checked like scalars.
//!
//! Every view evaluates all of its fields in a single aggregation.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;
use varqc_model::values::{any_to_f64, cell_u64};
use varqc_model::{Dataset, FieldCatalog};

use crate::error::{Result, ValidateError};
use crate::expr::{all_missing, count_where, fraction, list_element};
use crate::sink::ReportSink;

/// Shape of a value, deciding which missingness rule applies to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldShape {
    /// Nested record; its fields are walked.
    Record,
    /// Ordered list of values.
    Sequence,
    /// List carrying set semantics.
    Set,
    Scalar,
}

impl FieldShape {
    pub fn of(dtype: &DataType, is_set: bool) -> Self {
        match dtype {
            DataType::Struct(_) => Self::Record,
            DataType::List(_) | DataType::Array(..) if is_set => Self::Set,
            DataType::List(_) | DataType::Array(..) => Self::Sequence,
            _ => Self::Scalar,
        }
    }
}

/// Missing-fraction aggregates of a nested record, mirroring its layout.
#[derive(Debug, Clone)]
pub enum MissingnessTree {
    Record {
        path: String,
        children: Vec<MissingnessTree>,
    },
    Leaf {
        path: String,
        shape: FieldShape,
        /// Aggregate evaluating to the fraction of rows where the leaf is
        /// missing.
        fraction: Expr,
    },
}

impl MissingnessTree {
    pub fn path(&self) -> &str {
        match self {
            Self::Record { path, .. } | Self::Leaf { path, .. } => path,
        }
    }

    /// Every leaf in depth-first field order.
    pub fn leaves(&self) -> Vec<(&str, FieldShape, &Expr)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a str, FieldShape, &'a Expr)>) {
        match self {
            Self::Record { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            Self::Leaf {
                path,
                shape,
                fraction,
            } => out.push((path, *shape, fraction)),
        }
    }
}

/// Build the missingness tree of a value of type `dtype` read by `value`.
///
/// Paths are `prefix.field` for record members; `is_set` tells which list
/// paths carry set semantics.
pub fn missingness_tree(
    value: Expr,
    dtype: &DataType,
    prefix: &str,
    is_set: &dyn Fn(&str) -> bool,
) -> MissingnessTree {
    let shape = FieldShape::of(dtype, is_set(prefix));
    match (shape, dtype) {
        (FieldShape::Record, DataType::Struct(fields)) => MissingnessTree::Record {
            path: prefix.to_string(),
            children: fields
                .iter()
                .map(|field| {
                    let name = field.name().as_str();
                    missingness_tree(
                        value.clone().struct_().field_by_name(name),
                        field.dtype(),
                        &format!("{prefix}.{name}"),
                        is_set,
                    )
                })
                .collect(),
        },
        (FieldShape::Sequence | FieldShape::Set, DataType::Array(inner, _)) => {
            let as_list = value.cast(DataType::List(inner.clone()));
            leaf(prefix, shape, fraction(all_missing(as_list)))
        }
        (FieldShape::Sequence | FieldShape::Set, _) => {
            leaf(prefix, shape, fraction(all_missing(value)))
        }
        _ => leaf(prefix, FieldShape::Scalar, fraction(value.is_null())),
    }
}

fn leaf(path: &str, shape: FieldShape, fraction: Expr) -> MissingnessTree {
    MissingnessTree::Leaf {
        path: path.to_string(),
        shape,
        fraction,
    }
}

/// Missingness tree of the row field `field`, with paths prefixed by its
/// name, e.g. `info.AC-adj`.
pub fn check_missingness_of_struct(ds: &Dataset, field: &str) -> Result<MissingnessTree> {
    let catalog = ds.catalog()?;
    let root = catalog.row(field)?;
    let dtype = catalog
        .row_dtype(field)
        .cloned()
        .unwrap_or(DataType::Null);
    let is_set = |path: &str| ds.is_set_field(path);
    Ok(missingness_tree(root.expr(), &dtype, field, &is_set))
}

/// Evaluate every leaf of `tree` in one aggregation.
///
/// Returns `(path, fraction)` pairs in field order. A dataset with no rows
/// has no missing values.
pub fn flatten_missingness_struct(ds: &Dataset, tree: &MissingnessTree) -> Result<Vec<(String, f64)>> {
    let leaves = tree.leaves();
    if leaves.is_empty() {
        return Ok(Vec::new());
    }
    let aggs = leaves
        .iter()
        .enumerate()
        .map(|(idx, (_, _, fraction))| (*fraction).clone().alias(leaf_alias(idx)))
        .collect();
    let df = ds.aggregate(aggs)?;
    let mut out = Vec::with_capacity(leaves.len());
    for (idx, (path, _, _)) in leaves.iter().enumerate() {
        out.push(((*path).to_string(), read_fraction(&df, &leaf_alias(idx))?));
    }
    Ok(out)
}

fn leaf_alias(idx: usize) -> String {
    format!("__missing_{idx}")
}

fn read_fraction(df: &DataFrame, column: &str) -> Result<f64> {
    let value = any_to_f64(df.column(column)?.get(0)?).unwrap_or(0.0);
    Ok(if value.is_nan() { 0.0 } else { value })
}

/// Flat field expressions unfurled from arrays of records.
///
/// `indexed_array_annotations` maps a row array field, e.g. `freq`, to the
/// global index dictionary naming its positions, e.g. `freq_index_dict`.
/// Each (label, position) pair and record field `f` yields a field named
/// `{f}_{label}` reading `array[position].f`. A position past the end of a
/// row's array reads as missing.
pub fn unfurl_array_annotations(
    ds: &Dataset,
    indexed_array_annotations: &BTreeMap<String, String>,
) -> Result<Vec<(String, Expr)>> {
    let catalog = ds.catalog()?;
    let mut unfurled = Vec::new();
    for (array, index_dict) in indexed_array_annotations {
        let field = catalog.row(array)?;
        let dict = ds.globals().index_dict(index_dict)?;
        let members = record_members(&catalog, array)?;
        for (label, position) in dict.iter() {
            for member in &members {
                unfurled.push((
                    format!("{member}_{label}"),
                    list_element(field.expr(), position)
                        .struct_()
                        .field_by_name(member),
                ));
            }
        }
    }
    Ok(unfurled)
}

/// Field names of the records held by the list-of-structs row field `array`.
fn record_members(catalog: &FieldCatalog, array: &str) -> Result<Vec<String>> {
    match catalog.row_dtype(array) {
        Some(DataType::List(inner)) | Some(DataType::Array(inner, _)) => match inner.as_ref() {
            DataType::Struct(fields) => Ok(fields.iter().map(|f| f.name().to_string()).collect()),
            other => Err(unexpected(array, &DataType::List(Box::new(other.clone())))),
        },
        Some(other) => Err(unexpected(array, other)),
        None => Err(ValidateError::FieldNotFound {
            field: array.to_string(),
            scope: "row fields".to_string(),
        }),
    }
}

fn unexpected(field: &str, dtype: &DataType) -> ValidateError {
    ValidateError::UnexpectedType {
        field: field.to_string(),
        dtype: dtype.to_string(),
        expected: "list of structs".to_string(),
    }
}

/// Missing fraction of every unfurled array-of-record field, in one pass.
pub fn check_array_struct_missingness(
    ds: &Dataset,
    indexed_array_annotations: &BTreeMap<String, String>,
) -> Result<Vec<(String, f64)>> {
    let unfurled = unfurl_array_annotations(ds, indexed_array_annotations)?;
    if unfurled.is_empty() {
        return Ok(Vec::new());
    }
    let aggs = unfurled
        .iter()
        .map(|(name, expr)| fraction(expr.clone().is_null()).alias(name.as_str()))
        .collect();
    let df = ds.aggregate(aggs)?;
    let mut out = Vec::with_capacity(unfurled.len());
    for (name, _) in &unfurled {
        out.push((name.clone(), read_fraction(&df, name)?));
    }
    Ok(out)
}

/// Missingness of one field against the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingnessOutcome {
    pub metric: String,
    /// Missing row count, when counted directly.
    pub n_missing: Option<u64>,
    pub fraction: f64,
    pub passed: bool,
}

/// Outcomes of one missingness view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingnessReport {
    pub threshold: f64,
    pub outcomes: Vec<MissingnessOutcome>,
}

impl MissingnessReport {
    pub fn n_failed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.passed).count()
    }

    pub fn get(&self, metric: &str) -> Option<&MissingnessOutcome> {
        self.outcomes.iter().find(|outcome| outcome.metric == metric)
    }
}

/// Count missing values of every listed info and row field in one pass and
/// report each against `missingness_threshold`.
///
/// A field fails when its missing fraction of `n_sites` exceeds the
/// threshold.
pub fn compute_missingness(
    ds: &Dataset,
    info_metrics: &[String],
    non_info_metrics: &[String],
    n_sites: usize,
    missingness_threshold: f64,
    sink: &mut dyn ReportSink,
) -> Result<MissingnessReport> {
    sink.info(&format!(
        "Missingness threshold (upper cutoff for what is allowed for missingness checks): \
         {missingness_threshold:.2}"
    ));

    let catalog = ds.catalog()?;
    let mut metrics = Vec::with_capacity(info_metrics.len() + non_info_metrics.len());
    for name in info_metrics {
        metrics.push((name.clone(), catalog.info(name)?));
    }
    for name in non_info_metrics {
        metrics.push((name.clone(), catalog.row(name)?));
    }

    let mut report = MissingnessReport {
        threshold: missingness_threshold,
        outcomes: Vec::with_capacity(metrics.len()),
    };
    if !metrics.is_empty() {
        let aggs = metrics
            .iter()
            .enumerate()
            .map(|(idx, (_, field))| count_where(field.expr().is_null()).alias(leaf_alias(idx)))
            .collect();
        let df = ds.aggregate(aggs)?;
        for (idx, (metric, _)) in metrics.iter().enumerate() {
            let n_missing = cell_u64(&df, &leaf_alias(idx), 0)?;
            let fraction = if n_sites == 0 {
                0.0
            } else {
                n_missing as f64 / n_sites as f64
            };
            let passed = fraction <= missingness_threshold;
            sink.info(&format!(
                "{} missingness check for {metric}: {n_missing} sites or {:.2}% missing",
                if passed { "Passed" } else { "FAILED" },
                100.0 * fraction
            ));
            report.outcomes.push(MissingnessOutcome {
                metric: metric.clone(),
                n_missing: Some(n_missing),
                fraction,
                passed,
            });
        }
    }

    debug!(n_metrics = report.outcomes.len(), "computed missingness");
    sink.info(&format!("{} missing metrics checks failed", report.n_failed()));
    Ok(report)
}

/// Report precomputed missing fractions against `missingness_threshold`.
pub fn report_missingness_fractions(
    fractions: Vec<(String, f64)>,
    missingness_threshold: f64,
    sink: &mut dyn ReportSink,
) -> MissingnessReport {
    let mut report = MissingnessReport {
        threshold: missingness_threshold,
        outcomes: Vec::with_capacity(fractions.len()),
    };
    for (metric, fraction) in fractions {
        let passed = fraction <= missingness_threshold;
        sink.info(&format!(
            "{} missingness check for {metric}: {:.2}% missing",
            if passed { "Passed" } else { "FAILED" },
            100.0 * fraction
        ));
        report.outcomes.push(MissingnessOutcome {
            metric,
            n_missing: None,
            fraction,
            passed,
        });
    }
    sink.info(&format!("{} missing metrics checks failed", report.n_failed()));
    report
}
