//! Polars `AnyValue` helpers.
//!
//! Conversions used when reading aggregation results back out of a collected
//! frame and when rendering example rows for reports.

use polars::prelude::{AnyValue, DataFrame};

use crate::error::{ModelError, Result};

/// Placeholder shown for missing values in rendered rows.
pub const MISSING_DISPLAY: &str = "NA";

/// Converts a Polars AnyValue to a display string.
/// Null renders as `NA`, floats without trailing zeros.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => MISSING_DISPLAY.to_string(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Formats a floating-point number as a string without trailing zeros.
pub fn format_numeric(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        return format!("{v:.1}");
    }
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Converts an AnyValue to f64, returning None for non-numeric or null values.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::Boolean(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Converts an AnyValue to i64, returning None for non-integer or null values.
pub fn any_to_i64(value: AnyValue<'_>) -> Option<i64> {
    match value {
        AnyValue::Int8(v) => Some(i64::from(v)),
        AnyValue::Int16(v) => Some(i64::from(v)),
        AnyValue::Int32(v) => Some(i64::from(v)),
        AnyValue::Int64(v) => Some(v),
        AnyValue::UInt8(v) => Some(i64::from(v)),
        AnyValue::UInt16(v) => Some(i64::from(v)),
        AnyValue::UInt32(v) => Some(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).ok(),
        AnyValue::Float32(v) => Some(v as i64),
        AnyValue::Float64(v) => Some(v as i64),
        AnyValue::Boolean(b) => Some(i64::from(b)),
        _ => None,
    }
}

/// Reads a non-negative count from row `row` of `column`.
///
/// Null aggregation results (e.g. a sum over zero rows) read as zero.
pub fn cell_u64(df: &DataFrame, column: &str, row: usize) -> Result<u64> {
    let value = df.column(column)?.get(row)?;
    if matches!(value, AnyValue::Null) {
        return Ok(0);
    }
    let count = any_to_i64(value.clone()).ok_or_else(|| ModelError::UnexpectedType {
        column: column.to_string(),
        dtype: value.dtype().to_string(),
        expected: "integer count".to_string(),
    })?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// Reads a boolean flag from row `row` of `column`; null reads as false.
pub fn cell_bool(df: &DataFrame, column: &str, row: usize) -> Result<bool> {
    match df.column(column)?.get(row)? {
        AnyValue::Boolean(b) => Ok(b),
        AnyValue::Null => Ok(false),
        other => Ok(any_to_i64(other).is_some_and(|v| v != 0)),
    }
}

/// Reads a display string from row `row` of `column`.
pub fn cell_string(df: &DataFrame, column: &str, row: usize) -> Result<String> {
    Ok(any_to_string(df.column(column)?.get(row)?))
}
