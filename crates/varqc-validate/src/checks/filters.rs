//! Variant filter summaries.
//!
//! Counts variants by filter status and tabulates the fraction removed by
//! each filter, grouped by filter status, allele type, problematic-region
//! membership and allele count.

use polars::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};
use varqc_model::values::{cell_string, cell_u64};
use varqc_model::{Dataset, FieldCatalog};

use crate::display::DisplayTable;
use crate::error::Result;
use crate::expr::{any_of, fraction, list_contains, list_len, set_key};
use crate::sink::ReportSink;

const FILTERS_FIELD: &str = "filters";
const INBREEDING_FILTER: &str = "InbreedingCoeff";
const AC0_FILTER: &str = "AC0";

const N_FILTERS: &str = "__n_filters";
const HAS_INBREEDING: &str = "__has_inbreeding_coeff";
const HAS_AC0: &str = "__has_ac0";
const HAS_VARIANT_FILTER: &str = "__has_variant_filter";
const FILTER_SET: &str = "__filter_set";

pub const IS_FILTERED: &str = "is_filtered";
pub const IN_PROBLEMATIC_REGION: &str = "in_problematic_region";

/// Inputs of [`summarize_variant_filters`].
#[derive(Debug, Clone)]
pub struct FilterSummaryConfig<'a> {
    pub variant_filter_field: &'a str,
    pub problematic_regions: &'a [String],
    pub single_filter_count: bool,
    pub site_gt_checks: &'a [(String, Expr)],
    pub extra_filter_checks: &'a [(String, Expr)],
}

/// Counts gathered while summarizing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    /// Variant count per distinct filter set, e.g. `[AC0, RF]`.
    pub filter_counts: Vec<(String, u64)>,
    /// Variant count per individual filter, when requested.
    pub single_filter_counts: Option<Vec<(String, u64)>>,
    /// Matching-row count of every site genotype check.
    pub site_gt_counts: Vec<(String, u64)>,
    /// Group keys of every grouped fraction table, in emission order.
    pub groupings: Vec<Vec<String>>,
}

/// Row annotations the filter fractions are computed from.
///
/// `filters` is a list-of-strings column. The flags are added as columns
/// once so the grouped aggregations only combine plain boolean columns.
pub fn filter_flag_columns(filters: Expr, variant_filter_field: &str) -> Vec<Expr> {
    vec![
        list_len(filters.clone()).fill_null(lit(0)).alias(N_FILTERS),
        list_contains(filters.clone(), INBREEDING_FILTER).alias(HAS_INBREEDING),
        list_contains(filters.clone(), AC0_FILTER).alias(HAS_AC0),
        list_contains(filters, variant_filter_field).alias(HAS_VARIANT_FILTER),
    ]
}

/// Aggregations of a filter summary table, evaluated per group.
///
/// Expects the columns added by [`filter_flag_columns`].
pub fn make_filters_expr_dict(
    variant_filter_field: &str,
    extra_filter_checks: &[(String, Expr)],
) -> Vec<Expr> {
    let vff = variant_filter_field.to_lowercase();
    let only = |flag: &str| col(flag).and(col(N_FILTERS).eq(lit(1)));

    let mut aggs = vec![
        len().cast(DataType::Int64).alias("n"),
        fraction(col(N_FILTERS).neq(lit(0))).alias("frac_any_filter"),
        fraction(col(HAS_INBREEDING)).alias("frac_inbreed_coeff"),
        fraction(col(HAS_AC0)).alias("frac_ac0"),
        fraction(col(HAS_VARIANT_FILTER)).alias(format!("frac_{vff}")),
        fraction(only(HAS_INBREEDING)).alias("frac_inbreed_coeff_only"),
        fraction(only(HAS_AC0)).alias("frac_ac0_only"),
        fraction(only(HAS_VARIANT_FILTER)).alias(format!("frac_{vff}_only")),
    ];
    aggs.extend(
        extra_filter_checks
            .iter()
            .map(|(name, agg)| agg.clone().alias(name.as_str())),
    );
    aggs
}

/// Summarize variant filter status and log the grouped fraction tables.
pub fn summarize_variant_filters(
    ds: &Dataset,
    config: &FilterSummaryConfig<'_>,
    sink: &mut dyn ReportSink,
) -> Result<FilterSummary> {
    let catalog = ds.catalog()?;
    let filters = catalog.row(FILTERS_FIELD)?;
    let mut summary = FilterSummary::default();

    let counts = ds.group_by_aggregate(
        vec![set_key(filters.expr()).alias(FILTER_SET)],
        vec![len().cast(DataType::Int64).alias("n")],
    )?;
    summary.filter_counts = read_counter(&counts, FILTER_SET)?;
    sink.info(&format!(
        "Variant filter counts: {}",
        render_counter(&summary.filter_counts)
    ));

    if config.single_filter_count {
        let exploded = ds
            .select(vec![filters.expr()])
            .explode(FILTERS_FIELD)?
            .filter(col(FILTERS_FIELD).is_not_null());
        let counts = exploded.group_by_aggregate(
            vec![col(FILTERS_FIELD)],
            vec![len().cast(DataType::Int64).alias("n")],
        )?;
        let counts = read_counter(&counts, FILTERS_FIELD)?;
        sink.info(&format!(
            "Exploded variant filter counts: {}",
            render_counter(&counts)
        ));
        summary.single_filter_counts = Some(counts);
    }

    for (name, predicate) in config.site_gt_checks {
        let n = u64::try_from(ds.filter(predicate.clone()).count()?).unwrap_or(u64::MAX);
        sink.info(&format!("There are {n} {name} sites in the dataset."));
        summary.site_gt_counts.push((name.clone(), n));
    }

    let mut annotations = filter_flag_columns(filters.expr(), config.variant_filter_field);
    annotations.push(col(N_FILTERS).gt(lit(0)).alias(IS_FILTERED));
    let region = problematic_region_expr(&catalog, config.problematic_regions, sink);
    let has_region = region.is_some();
    if let Some(region) = region {
        annotations.push(region.alias(IN_PROBLEMATIC_REGION));
    }
    let optional_info = |name: &str| {
        catalog
            .try_info(name)
            .map(|field| (name.to_string(), field.expr().alias(name)))
    };
    let allele_type = optional_info("allele_type");
    let n_alt_alleles = optional_info("n_alt_alleles");

    // Flags feed up to four grouped passes; materialize them once.
    let flagged = ds
        .annotate(annotations)
        .annotate(
            allele_type
                .iter()
                .chain(n_alt_alleles.iter())
                .map(|(_, expr)| expr.clone())
                .collect(),
        )
        .persist()?;
    let aggs = make_filters_expr_dict(config.variant_filter_field, config.extra_filter_checks);

    // 1. Filter status alone
    sink.info("Checking distributions of filtered variants amongst variant filters...");
    emit_grouped(&flagged, &[IS_FILTERED.to_string()], &aggs, &mut summary, sink)?;

    // 2. Allele type
    let mut keys: Vec<String> = Vec::new();
    if let Some((name, _)) = &allele_type {
        sink.info("Checking distributions of variant type amongst variant filters...");
        keys.push(name.clone());
        emit_grouped(&flagged, &keys, &aggs, &mut summary, sink)?;
    }

    // 3. Problematic regions
    if has_region {
        sink.info(
            "Checking distributions of variant type and region type amongst variant filters...",
        );
        keys.push(IN_PROBLEMATIC_REGION.to_string());
        emit_grouped(&flagged, &keys, &aggs, &mut summary, sink)?;
    }

    // 4. Number of alternate alleles
    if let Some((name, _)) = &n_alt_alleles {
        sink.info(
            "Checking distributions of variant type, region type, and number of alt alleles \
             amongst variant filters...",
        );
        keys.push(name.clone());
        emit_grouped(&flagged, &keys, &aggs, &mut summary, sink)?;
    }

    Ok(summary)
}

fn problematic_region_expr(
    catalog: &FieldCatalog,
    regions: &[String],
    sink: &mut dyn ReportSink,
) -> Option<Expr> {
    let mut flags = Vec::with_capacity(regions.len());
    for region in regions {
        match catalog.try_info(region) {
            Some(field) => flags.push(field.expr()),
            None => {
                warn!(region = %region, "problematic region flag absent");
                sink.warn(&format!("{region} is not in table's info field"));
            }
        }
    }
    (!flags.is_empty()).then(|| any_of(flags))
}

/// Group by `keys`, order by `n` descending (ties by key), and emit the
/// resulting table titled after its keys.
fn emit_grouped(
    ds: &Dataset,
    keys: &[String],
    aggs: &[Expr],
    summary: &mut FilterSummary,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    let grouped = ds.group_by_aggregate(
        keys.iter().map(|key| col(key.as_str())).collect(),
        aggs.to_vec(),
    )?;
    let mut by = vec!["n".to_string()];
    by.extend(keys.iter().cloned());
    let mut descending = vec![true];
    descending.extend(keys.iter().map(|_| false));
    let ordered = grouped.sort(
        by,
        SortMultipleOptions::default()
            .with_order_descending_multi(descending)
            .with_nulls_last(true),
    )?;
    debug!(keys = ?keys, groups = ordered.height(), "filter summary table");
    sink.table(
        DisplayTable::from_frame(&ordered)?
            .with_title(format!("Filter fractions by {}", keys.join(", "))),
    );
    summary.groupings.push(keys.to_vec());
    Ok(())
}

fn read_counter(df: &DataFrame, key: &str) -> Result<Vec<(String, u64)>> {
    let mut counts = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        counts.push((cell_string(df, key, row)?, cell_u64(df, "n", row)?));
    }
    counts.sort();
    Ok(counts)
}

fn render_counter(counts: &[(String, u64)]) -> String {
    let entries: Vec<String> = counts
        .iter()
        .map(|(key, n)| format!("{key}: {n}"))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
