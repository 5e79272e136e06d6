//! VCF header completeness.
//!
//! Before export, every info field, filter value and format field must have
//! a non-empty description in the header dictionary.

use polars::prelude::*;
use varqc_model::values::cell_string;
use varqc_model::{Dataset, HeaderDict, hist_fields};

use crate::error::Result;
use crate::sink::ReportSink;

const FILTERS_FIELD: &str = "filters";

/// Fields never written to the exported VCF.
const NOT_EXPORTED: [&str; 1] = ["END"];

/// Check that `row_annotations`, histogram fields, every filter value in the
/// dataset and, when given, `entry_annotations` are described in `header`.
///
/// Returns `true` when nothing is missing.
pub fn vcf_field_check<S: AsRef<str>>(
    ds: &Dataset,
    header: &HeaderDict,
    row_annotations: &[String],
    entry_annotations: Option<&[String]>,
    hists: &[S],
    sink: &mut dyn ReportSink,
) -> Result<bool> {
    let mut info_fields = row_annotations.to_vec();
    for field in hist_fields(hists) {
        if !info_fields.contains(&field) {
            info_fields.push(field);
        }
    }

    let mut sections = vec![("info", info_fields), ("filter", distinct_filters(ds)?)];
    if let Some(entries) = entry_annotations.filter(|entries| !entries.is_empty()) {
        sections.push(("format", entries.to_vec()));
    }

    let mut missing_fields = Vec::new();
    let mut missing_descriptions = Vec::new();
    for (section, fields) in &sections {
        let described = header.get(*section);
        for field in fields {
            match described.and_then(|entries| entries.get(field)) {
                Some(description) if description.is_empty() => {
                    sink.warn(&format!(
                        "{field} in {section} field has empty description in VCF header!"
                    ));
                    missing_descriptions.push(field.clone());
                }
                Some(_) => {}
                None => {
                    sink.warn(&format!(
                        "{field} in {section} field does not exist in VCF header!"
                    ));
                    if !NOT_EXPORTED.contains(&field.as_str()) {
                        missing_fields.push(field.clone());
                    }
                }
            }
        }
    }

    if !missing_fields.is_empty() || !missing_descriptions.is_empty() {
        sink.error(
            "Some fields are either missing or missing descriptions in the VCF header! \
             Please reconcile.",
        );
        sink.error(&format!("Missing fields: [{}]", missing_fields.join(", ")));
        sink.error(&format!(
            "Missing descriptions: [{}]",
            missing_descriptions.join(", ")
        ));
        return Ok(false);
    }

    sink.info("Passed VCF fields check!");
    Ok(true)
}

/// Every filter value used by at least one row, sorted.
fn distinct_filters(ds: &Dataset) -> Result<Vec<String>> {
    let catalog = ds.catalog()?;
    let Ok(filters) = catalog.row(FILTERS_FIELD) else {
        return Ok(Vec::new());
    };
    let exploded = ds
        .select(vec![filters.expr()])
        .explode(FILTERS_FIELD)?
        .filter(col(FILTERS_FIELD).is_not_null());
    let df = exploded.group_by_aggregate(vec![col(FILTERS_FIELD)], vec![len().alias("n")])?;
    let mut values = (0..df.height())
        .map(|row| cell_string(&df, FILTERS_FIELD, row))
        .collect::<varqc_model::Result<Vec<_>>>()?;
    values.sort();
    Ok(values)
}
