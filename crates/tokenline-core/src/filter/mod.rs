//! Composable filter AST for ad-hoc transfer queries
//!
//! Filters are a tagged-variant expression tree over named logical fields
//! with JSON scalar comparison values. The tree carries no knowledge of the
//! storage schema: field names are validated against the column catalog by
//! the store-side translator, which is also the only place SQL is rendered.
//! The namespace is never part of a filter expression; every query is scoped
//! to the caller's namespace by the translator itself.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A filter predicate over logical transfer fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Field equals value
    Eq(String, JsonValue),
    /// Field strictly greater than value
    Gt(String, JsonValue),
    /// Field greater than or equal to value
    Gte(String, JsonValue),
    /// Field strictly less than value
    Lt(String, JsonValue),
    /// Field less than or equal to value
    Lte(String, JsonValue),
    /// All child predicates hold
    And(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Equality predicate
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        FilterExpr::Eq(field.into(), value.into())
    }

    /// Greater-than predicate
    pub fn gt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        FilterExpr::Gt(field.into(), value.into())
    }

    /// Greater-than-or-equal predicate
    pub fn gte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        FilterExpr::Gte(field.into(), value.into())
    }

    /// Less-than predicate
    pub fn lt(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        FilterExpr::Lt(field.into(), value.into())
    }

    /// Less-than-or-equal predicate
    pub fn lte(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        FilterExpr::Lte(field.into(), value.into())
    }

    /// Conjunction of predicates
    pub fn and(children: impl IntoIterator<Item = FilterExpr>) -> Self {
        FilterExpr::And(children.into_iter().collect())
    }
}

/// Sort directive for a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    /// Logical field name (validated by the translator)
    pub field: String,
    /// Descending order when true
    pub descending: bool,
}

/// A complete filter envelope: predicate, ordering, pagination, count flag
///
/// Built with chained setters:
///
/// ```
/// use tokenline_core::filter::{FilterExpr, FilterQuery};
///
/// let query = FilterQuery::new()
///     .filter(FilterExpr::and([
///         FilterExpr::eq("pool", "7f1d0f0e-5e9a-4c7e-9f3a-2b8c6d4e1a90"),
///         FilterExpr::eq("from", "0x01"),
///     ]))
///     .limit(50)
///     .count(true);
/// assert!(query.count_requested());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterQuery {
    /// Optional predicate; None matches every row in the namespace
    pub expr: Option<FilterExpr>,
    /// Sort directives, applied in order; empty means the store default
    pub sort: Vec<SortField>,
    /// Number of leading rows to skip
    pub skip: Option<u64>,
    /// Maximum number of rows to return
    pub limit: Option<u64>,
    count: bool,
}

impl FilterQuery {
    /// Create an empty query (matches everything in the namespace)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter predicate
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.expr = Some(expr);
        self
    }

    /// Append a sort directive
    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort.push(SortField {
            field: field.into(),
            descending,
        });
        self
    }

    /// Skip the first `n` rows
    pub fn skip(mut self, n: u64) -> Self {
        self.skip = Some(n);
        self
    }

    /// Return at most `n` rows
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Request a parallel total-count query sharing the same predicate
    pub fn count(mut self, requested: bool) -> Self {
        self.count = requested;
        self
    }

    /// Whether a total count was requested
    pub fn count_requested(&self) -> bool {
        self.count
    }
}
