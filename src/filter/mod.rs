//! Filter predicate builder.
//!
//! Turns the UI's ordered list of `(column, operator, value)` filters into a
//! single conjunctive predicate. Comparison semantics follow the column's
//! [`TypeClass`]: numeric and temporal columns use `TRY_CAST` on both sides so
//! a malformed literal degrades to "no match" instead of failing the query.
//!
//! Pattern operators (`contains`, `startswith`, `endswith`) do not escape `%`
//! or `_` in the value; they act as wildcards.

mod op;

pub use op::FilterOp;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PivotResult;
use crate::sql::{quote_identifier, quote_literal, TypeClass};

/// Type assumed for columns missing from the type map.
const DEFAULT_COLUMN_TYPE: &str = "VARCHAR";

const TRUE_LITERALS: &[&str] = &["true", "t", "1", "yes", "y"];
const FALSE_LITERALS: &[&str] = &["false", "f", "0", "no", "n"];

/// One filter row as sent by the UI.
///
/// The operator stays a raw token until [`build_where`] validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(rename = "col", default)]
    pub column: String,
    #[serde(default = "default_op")]
    pub op: String,
    #[serde(default)]
    pub value: String,
}

fn default_op() -> String {
    FilterOp::Eq.as_str().to_string()
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, op: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: op.into(),
            value: value.into(),
        }
    }
}

/// Build a `WHERE` body from `filters`.
///
/// `column_types` maps column names to the raw types reported by `DESCRIBE`.
/// Returns an empty string when no clause was produced; callers must then omit
/// the `WHERE` keyword entirely.
///
/// # Errors
///
/// [`PivotError::UnsupportedOperator`](crate::PivotError::UnsupportedOperator)
/// for any operator outside [`FilterOp::ALL`].
pub fn build_where(
    filters: &[FilterSpec],
    column_types: &HashMap<String, String>,
) -> PivotResult<String> {
    let mut clauses = Vec::with_capacity(filters.len());

    for filter in filters {
        if filter.column.is_empty() {
            continue;
        }
        let op: FilterOp = filter.op.parse()?;
        let raw_type = column_types
            .get(&filter.column)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLUMN_TYPE);

        clauses.push(build_clause(
            &filter.column,
            op,
            &filter.value,
            TypeClass::from_raw(raw_type),
        ));
    }

    Ok(clauses.join(" AND "))
}

fn build_clause(column: &str, op: FilterOp, value: &str, class: TypeClass) -> String {
    let col = quote_identifier(column);

    if op.is_null_check() {
        let negate = if op == FilterOp::NotNull { " NOT" } else { "" };
        return format!("{col} IS{negate} NULL");
    }

    match op {
        FilterOp::Contains => {
            return format!(
                "CAST({col} AS VARCHAR) ILIKE '%' || {} || '%'",
                quote_literal(value)
            )
        }
        FilterOp::StartsWith => {
            return format!(
                "CAST({col} AS VARCHAR) ILIKE {}",
                quote_literal(format!("{value}%"))
            )
        }
        FilterOp::EndsWith => {
            return format!(
                "CAST({col} AS VARCHAR) ILIKE {}",
                quote_literal(format!("%{value}"))
            )
        }
        _ => {}
    }

    // Only comparison operators remain.
    let cmp = op.comparison_sql().unwrap_or("=");
    let lit = quote_literal(value);

    if let Some(target) = class.cast_target() {
        return format!("TRY_CAST({col} AS {target}) {cmp} TRY_CAST({lit} AS {target})");
    }

    if class == TypeClass::Boolean {
        let normalized = value.trim().to_lowercase();
        if TRUE_LITERALS.contains(&normalized.as_str()) {
            return format!("CAST({col} AS BOOLEAN) {cmp} TRUE");
        }
        if FALSE_LITERALS.contains(&normalized.as_str()) {
            return format!("CAST({col} AS BOOLEAN) {cmp} FALSE");
        }
        return format!("CAST({col} AS VARCHAR) {cmp} {lit}");
    }

    format!("{col} {cmp} {lit}")
}
