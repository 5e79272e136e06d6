//! Expression helpers shared by the check families.
//!
//! Reductions follow the conventions of the release checks: a missing
//! predicate never counts as a failure, and sums of stratified fields skip
//! missing terms.

use polars::prelude::*;
use varqc_model::values::any_to_string;

/// Number of rows where `predicate` is true. Missing counts as false.
pub fn count_where(predicate: Expr) -> Expr {
    predicate
        .fill_null(lit(false))
        .cast(DataType::Int64)
        .sum()
}

/// Fraction of rows where `predicate` is true.
pub fn fraction(predicate: Expr) -> Expr {
    count_where(predicate).cast(DataType::Float64) / len().cast(DataType::Float64)
}

/// Row-wise sum that ignores missing terms. No terms sums to zero.
pub fn sum_skipping_missing(terms: Vec<Expr>) -> Expr {
    let mut terms = terms.into_iter();
    match terms.next() {
        None => lit(0i64),
        Some(first) => terms.fold(first.fill_null(lit(0)), |acc, term| {
            acc + term.fill_null(lit(0))
        }),
    }
}

/// Row-wise sum where any missing term makes the sum missing.
pub fn sum_propagating_missing(terms: Vec<Expr>) -> Expr {
    let mut terms = terms.into_iter();
    match terms.next() {
        None => lit(0i64),
        Some(first) => terms.fold(first, |acc, term| acc + term),
    }
}

/// Row-wise logical OR. No terms is false.
pub fn any_of(terms: Vec<Expr>) -> Expr {
    let mut terms = terms.into_iter();
    match terms.next() {
        None => lit(false),
        Some(first) => terms.fold(first.fill_null(lit(false)), |acc, term| {
            acc.or(term.fill_null(lit(false)))
        }),
    }
}

/// Length of a list field; missing lists have missing length.
pub fn list_len(list: Expr) -> Expr {
    list.list().len()
}

/// Element `index` of a list field, missing when out of range.
pub fn list_element(list: Expr, index: usize) -> Expr {
    let index = i64::try_from(index).unwrap_or(i64::MAX);
    list.list().get(lit(index), true)
}

fn boolean_map<F>(expr: Expr, f: F) -> Expr
where
    F: Fn(&Column) -> PolarsResult<BooleanChunked> + Send + Sync + 'static,
{
    expr.map(
        move |c: Column| {
            let out = f(&c)?.with_name(c.name().clone());
            Ok(out.into_column())
        },
        |_, field| Ok(Field::new(field.name().clone(), DataType::Boolean)),
    )
}

/// Whether a list of strings contains `value`. Missing lists stay missing.
pub fn list_contains(list: Expr, value: &str) -> Expr {
    let value = value.to_string();
    boolean_map(list, move |c| match c.dtype() {
        DataType::List(_) => Ok(c
            .list()?
            .into_iter()
            .map(|element| element.map(|s| strings_contain(&s, &value)))
            .collect()),
        _ => Ok(BooleanChunked::full_null(PlSmallStr::EMPTY, c.len())),
    })
}

/// Whether any struct in a list of structs has `field == value`.
pub fn list_struct_field_contains(list: Expr, field: &str, value: &str) -> Expr {
    let field = field.to_string();
    let value = value.to_string();
    boolean_map(list, move |c| match c.dtype() {
        DataType::List(_) => Ok(c
            .list()?
            .into_iter()
            .map(|element| {
                Some(element.is_some_and(|s| {
                    s.struct_()
                        .ok()
                        .and_then(|structs| structs.field_by_name(&field).ok())
                        .is_some_and(|values| strings_contain(&values, &value))
                }))
            })
            .collect()),
        _ => Ok(BooleanChunked::full(PlSmallStr::EMPTY, false, c.len())),
    })
}

/// Whether a value carries no information.
///
/// Scalars are missing when null. Lists (and sets) are missing when null,
/// empty, or when every element is null.
pub fn all_missing(value: Expr) -> Expr {
    boolean_map(value, |c| match c.dtype() {
        DataType::List(_) => Ok(c
            .list()?
            .into_iter()
            .map(|element| Some(element.is_none_or(|s| s.null_count() == s.len())))
            .collect()),
        DataType::Null => Ok(BooleanChunked::full(PlSmallStr::EMPTY, true, c.len())),
        _ => Ok(c.is_null()),
    })
}

/// Render a list as a sorted, de-duplicated key such as `[AC0, RF]`, so
/// set-valued fields can be grouped and counted.
pub fn set_key(list: Expr) -> Expr {
    list.map(
        move |c: Column| {
            let out: StringChunked = match c.dtype() {
                DataType::List(_) => c
                    .list()?
                    .into_iter()
                    .map(|element| element.map(|s| render_set(&s)))
                    .collect(),
                _ => StringChunked::full_null(PlSmallStr::EMPTY, c.len()),
            };
            Ok(out.with_name(c.name().clone()).into_column())
        },
        |_, field| Ok(Field::new(field.name().clone(), DataType::String)),
    )
}

fn strings_contain(values: &Series, needle: &str) -> bool {
    values
        .str()
        .is_ok_and(|ca| ca.into_iter().any(|v| v == Some(needle)))
}

fn render_set(values: &Series) -> String {
    let mut items: Vec<String> = (0..values.len())
        .filter_map(|i| values.get(i).ok())
        .map(any_to_string)
        .collect();
    items.sort();
    items.dedup();
    format!("[{}]", items.join(", "))
}
