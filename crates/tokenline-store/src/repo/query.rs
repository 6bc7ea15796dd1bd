//! Filter-to-SQL translation
//!
//! Turns a FilterQuery into a bounded, parameterized SELECT (and an optional
//! COUNT sharing the same predicate), always scoped to the caller-supplied
//! namespace. Translation failures surface before any database round-trip.
//!
//! SAFETY: The generated SQL is safe from injection because:
//! 1. Column names come from the row codec catalog, never from user input
//! 2. Operators and combinators are hardcoded per AST variant
//! 3. All comparison values are bound as `?n` parameters
//! 4. Sort direction comes from a bool, not user strings

#![allow(clippy::result_large_err)]

use crate::errors::{filter_field_error, Result};
use crate::repo::columns::{column_list, lookup_field, FieldType, TABLE};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use tokenline_core::filter::{FilterExpr, FilterQuery, SortField};
use tokenline_core::model::TokenAmount;
use uuid::Uuid;

/// A translated query: SQL text, optional count SQL, shared parameters
#[derive(Debug)]
pub(crate) struct BoundQuery {
    pub sql: String,
    pub count_sql: Option<String>,
    pub params: Vec<Value>,
}

/// Translate a filter into a namespace-scoped SELECT
///
/// The namespace predicate is always injected here, as the first bound
/// parameter; a filter expression has no way to address the namespace
/// column, so a badly composed filter cannot leak rows across namespaces.
pub(crate) fn build_select(namespace: &str, query: &FilterQuery) -> Result<BoundQuery> {
    let mut params: Vec<Value> = vec![Value::Text(namespace.to_string())];

    let mut predicate = "namespace = ?1".to_string();
    if let Some(expr) = &query.expr {
        let rendered = render_expr(expr, &mut params)?;
        predicate.push_str(" AND ");
        predicate.push_str(&rendered);
    }

    let order_clause = render_order(&query.sort)?;

    let mut sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}",
        column_list(),
        TABLE,
        predicate,
        order_clause
    );
    match (query.limit, query.skip) {
        (Some(limit), Some(skip)) => {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, skip));
        }
        (Some(limit), None) => {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        // SQLite requires a LIMIT clause before OFFSET; -1 means unlimited
        (None, Some(skip)) => {
            sql.push_str(&format!(" LIMIT -1 OFFSET {}", skip));
        }
        (None, None) => {}
    }

    // The count query shares predicate and parameters, but never the
    // pagination clause: the total is the full match count.
    let count_sql = query
        .count_requested()
        .then(|| format!("SELECT COUNT(*) FROM {} WHERE {}", TABLE, predicate));

    Ok(BoundQuery {
        sql,
        count_sql,
        params,
    })
}

fn render_expr(expr: &FilterExpr, params: &mut Vec<Value>) -> Result<String> {
    match expr {
        FilterExpr::And(children) => {
            if children.is_empty() {
                return Ok("1 = 1".to_string());
            }
            let parts = children
                .iter()
                .map(|child| render_expr(child, params))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("({})", parts.join(" AND ")))
        }
        FilterExpr::Eq(field, value) => render_comparison(field, "=", value, params),
        FilterExpr::Gt(field, value) => render_comparison(field, ">", value, params),
        FilterExpr::Gte(field, value) => render_comparison(field, ">=", value, params),
        FilterExpr::Lt(field, value) => render_comparison(field, "<", value, params),
        FilterExpr::Lte(field, value) => render_comparison(field, "<=", value, params),
    }
}

fn render_comparison(
    field: &str,
    op_sql: &str,
    value: &JsonValue,
    params: &mut Vec<Value>,
) -> Result<String> {
    let (column, field_type) =
        lookup_field(field).ok_or_else(|| filter_field_error(field, "unknown field"))?;
    let bound = coerce_value(field, field_type, value)?;
    params.push(bound);
    Ok(format!("{} {} ?{}", column, op_sql, params.len()))
}

/// Coerce a JSON scalar into the bound parameter a column expects
fn coerce_value(field: &str, field_type: FieldType, value: &JsonValue) -> Result<Value> {
    if value.is_array() || value.is_object() {
        return Err(filter_field_error(field, "expects a scalar value"));
    }
    if value.is_null() {
        return Err(filter_field_error(field, "expects a scalar value, not null"));
    }

    match field_type {
        FieldType::Text => value
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(|| filter_field_error(field, "expects a string value")),
        FieldType::Uuid => {
            let raw = value
                .as_str()
                .ok_or_else(|| filter_field_error(field, "expects a UUID string"))?;
            let parsed = Uuid::parse_str(raw)
                .map_err(|e| filter_field_error(field, format!("not a valid UUID: {}", e)))?;
            Ok(Value::Text(parsed.to_string()))
        }
        FieldType::Timestamp => match value {
            JsonValue::Number(n) => n
                .as_i64()
                .map(Value::Integer)
                .ok_or_else(|| filter_field_error(field, "expects epoch milliseconds")),
            JsonValue::String(s) => {
                let parsed = chrono::DateTime::parse_from_rfc3339(s).map_err(|e| {
                    filter_field_error(field, format!("not a valid RFC 3339 timestamp: {}", e))
                })?;
                Ok(Value::Integer(parsed.timestamp_millis()))
            }
            _ => Err(filter_field_error(
                field,
                "expects epoch milliseconds or an RFC 3339 string",
            )),
        },
        FieldType::Amount => {
            let raw = value
                .as_str()
                .ok_or_else(|| filter_field_error(field, "expects a decimal string"))?;
            let amount = TokenAmount::from_str(raw)
                .map_err(|e| filter_field_error(field, e.to_string()))?;
            Ok(Value::Text(amount.as_str().to_string()))
        }
    }
}

fn render_order(sort: &[SortField]) -> Result<String> {
    if sort.is_empty() {
        // Newest first, with the v7 local ID as a deterministic tiebreak
        return Ok("created DESC, local_id DESC".to_string());
    }
    let mut parts = Vec::with_capacity(sort.len());
    for directive in sort {
        let (column, _) = lookup_field(&directive.field)
            .ok_or_else(|| filter_field_error(&directive.field, "unknown sort field"))?;
        let direction = if directive.descending { "DESC" } else { "ASC" };
        parts.push(format!("{} {}", column, direction));
    }
    Ok(parts.join(", "))
}
