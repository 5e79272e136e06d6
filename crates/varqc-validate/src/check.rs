//! Field-check entries and the registry that collects them.
//!
//! A [`FieldCheck`] pairs a human-readable description of the *expected*
//! condition with a predicate that is true on rows *violating* it, so the
//! rows a report shows are always the failing ones.

use polars::prelude::*;
use varqc_model::FieldRef;

use crate::expr::count_where;

/// A named expression shown when a check fails.
#[derive(Debug, Clone)]
pub struct DisplayField {
    pub name: String,
    pub expr: Expr,
}

impl DisplayField {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr,
        }
    }

    /// Show a resolved dataset field under its leaf name.
    pub fn field(field: &FieldRef) -> Self {
        Self::new(field.name(), field.expr())
    }

    pub fn aliased(&self) -> Expr {
        self.expr.clone().alias(self.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FieldCheck {
    pub description: String,
    pub predicate: Expr,
    pub display: Vec<DisplayField>,
}

impl FieldCheck {
    pub fn new(description: impl Into<String>, predicate: Expr) -> Self {
        Self {
            description: description.into(),
            predicate,
            display: Vec::new(),
        }
    }

    #[must_use]
    pub fn show(mut self, field: &FieldRef) -> Self {
        self.display.push(DisplayField::field(field));
        self
    }

    #[must_use]
    pub fn show_expr(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.display.push(DisplayField::new(name, expr));
        self
    }

    /// Aggregate expression producing this check's failure count.
    pub fn failure_count(&self) -> Expr {
        count_where(self.predicate.clone())
    }
}

/// Ordered collection of checks keyed by description.
///
/// Adding a check whose description is already registered replaces the
/// earlier entry in place.
#[derive(Debug, Clone, Default)]
pub struct FieldCheckRegistry {
    checks: Vec<FieldCheck>,
}

impl FieldCheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, check: FieldCheck) {
        match self
            .checks
            .iter_mut()
            .find(|existing| existing.description == check.description)
        {
            Some(existing) => *existing = check,
            None => self.checks.push(check),
        }
    }

    pub fn extend(&mut self, other: FieldCheckRegistry) {
        for check in other.checks {
            self.insert(check);
        }
    }

    pub fn get(&self, description: &str) -> Option<&FieldCheck> {
        self.checks
            .iter()
            .find(|check| check.description == description)
    }

    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|check| check.description.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldCheck> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldCheckRegistry {
    type Item = &'a FieldCheck;
    type IntoIter = std::slice::Iter<'a, FieldCheck>;

    fn into_iter(self) -> Self::IntoIter {
        self.checks.iter()
    }
}

impl FromIterator<FieldCheck> for FieldCheckRegistry {
    fn from_iter<I: IntoIterator<Item = FieldCheck>>(iter: I) -> Self {
        let mut registry = Self::new();
        for check in iter {
            registry.insert(check);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_description_replaces_in_place() {
        let mut registry = FieldCheckRegistry::new();
        registry.insert(FieldCheck::new("a", lit(true)));
        registry.insert(FieldCheck::new("b", lit(true)));
        registry.insert(FieldCheck::new("a", lit(false)).show_expr("x", lit(1)));

        assert_eq!(registry.descriptions().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.get("a").map(|c| c.display.len()), Some(1));
    }
}
