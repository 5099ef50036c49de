//! SQL text for long and wide pivots.
//!
//! These builders are pure: they take a relation expression (see
//! [`resolve_relation`](crate::source::resolve_relation)) and a request and
//! return query text. Every column name passes through
//! [`quote_identifier`] and every value through [`quote_literal`].

use serde_json::Value;

use super::alias::AliasGenerator;
use super::{Aggregation, PivotRequest, WidePivotRequest};
use crate::error::{PivotError, PivotResult};
use crate::sql::{literal_text, quote_identifier, quote_literal};

/// Alias of the aggregate column in long pivots.
pub const VALUE_COLUMN: &str = "value";

/// Alias of the distinct-values column in the discovery query.
pub const DISTINCT_VALUE_COLUMN: &str = "v";

fn where_clause(where_sql: &str) -> Option<String> {
    let trimmed = where_sql.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("WHERE {trimmed}"))
    }
}

fn dims_list(row_dims: &[String]) -> String {
    row_dims
        .iter()
        .map(|d| quote_identifier(d))
        .collect::<Vec<_>>()
        .join(", ")
}

fn assemble(clauses: Vec<Option<String>>) -> String {
    clauses.into_iter().flatten().collect::<Vec<_>>().join("\n")
}

/// `SELECT <dims>, <agg> AS value ... ORDER BY value DESC LIMIT n`.
///
/// # Errors
///
/// [`PivotError::NoRowDimensions`] when `row_dims` is empty and
/// [`PivotError::InvalidRequest`] for a zero limit or a row dimension named
/// `value`, which would collide with the aggregate alias.
pub fn long_pivot_sql(relation: &str, request: &PivotRequest) -> PivotResult<String> {
    if request.row_dims.is_empty() {
        return Err(PivotError::NoRowDimensions);
    }
    request.validate_limit()?;
    if let Some(dim) = request
        .row_dims
        .iter()
        .find(|d| d.eq_ignore_ascii_case(VALUE_COLUMN))
    {
        return Err(PivotError::InvalidRequest(format!(
            "row dimension '{dim}' collides with the '{VALUE_COLUMN}' output column"
        )));
    }

    let dims = dims_list(&request.row_dims);
    let agg = match request.aggregation {
        Aggregation::Count => "COUNT(*)".to_string(),
        other => format!("{}({})", other, quote_identifier(&request.measure)),
    };

    Ok(assemble(vec![
        Some(format!("SELECT {dims}, {agg} AS {VALUE_COLUMN}")),
        Some(format!("FROM {relation}")),
        where_clause(&request.where_sql),
        Some(format!("GROUP BY {dims}")),
        Some(format!("ORDER BY {VALUE_COLUMN} DESC")),
        Some(format!("LIMIT {}", request.limit)),
    ]))
}

/// Number of distinct values of `col_dim` under the predicate.
///
/// NULL counts as one value: `COUNT(DISTINCT ..)` skips it, but the values
/// query returns it and the wide plan gives it its own column.
pub fn distinct_count_sql(relation: &str, col_dim: &str, where_sql: &str) -> String {
    let col = quote_identifier(col_dim);
    assemble(vec![
        Some(format!(
            "SELECT COUNT(DISTINCT {col}) + COALESCE(MAX(CASE WHEN {col} IS NULL THEN 1 ELSE 0 END), 0) FROM {relation}"
        )),
        where_clause(where_sql),
    ])
}

/// Distinct values of `col_dim` under the predicate, in the engine's ascending order.
pub fn distinct_values_sql(relation: &str, col_dim: &str, where_sql: &str) -> String {
    assemble(vec![
        Some(format!(
            "SELECT DISTINCT {} AS {DISTINCT_VALUE_COLUMN} FROM {relation}",
            quote_identifier(col_dim)
        )),
        where_clause(where_sql),
        Some("ORDER BY 1".to_string()),
    ])
}

/// One generated output column of a wide pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct WideColumn {
    /// The distinct value this column aggregates.
    pub value: Value,
    /// The generated column name.
    pub alias: String,
}

/// Final wide-pivot query plus the value-to-alias mapping it uses.
#[derive(Debug, Clone, PartialEq)]
pub struct WidePivotPlan {
    /// `None` when there is nothing to select (no values and no row dims).
    pub sql: Option<String>,
    pub columns: Vec<WideColumn>,
}

fn case_expression(request: &WidePivotRequest, value: &Value, alias: &str) -> String {
    let col = quote_identifier(&request.col_dim);
    let condition = if value.is_null() {
        format!("{col} IS NULL")
    } else {
        format!("{col} = {}", quote_literal(literal_text(value)))
    };

    match request.pivot.aggregation {
        Aggregation::Count => format!(
            "SUM(CASE WHEN {condition} THEN 1 ELSE 0 END) AS {}",
            quote_identifier(alias)
        ),
        other => format!(
            "{other}(CASE WHEN {condition} THEN {} END) AS {}",
            quote_identifier(&request.pivot.measure),
            quote_identifier(alias)
        ),
    }
}

/// Build the conditional-aggregation query for the discovered `values`.
///
/// `values` must already be in the order the output columns should appear;
/// alias collisions are resolved in that order. Row dimension names are
/// reserved so a generated alias never shadows them.
pub fn plan_wide_pivot(
    relation: &str,
    request: &WidePivotRequest,
    values: &[Value],
) -> PivotResult<WidePivotPlan> {
    request.validate()?;

    let row_dims = &request.pivot.row_dims;
    let mut aliases = AliasGenerator::with_reserved(row_dims.iter().cloned());

    let mut select_items: Vec<String> = row_dims.iter().map(|d| quote_identifier(d)).collect();
    let mut columns = Vec::with_capacity(values.len());

    for value in values {
        let alias = aliases.make_alias(&literal_text(value));
        select_items.push(case_expression(request, value, &alias));
        columns.push(WideColumn {
            value: value.clone(),
            alias,
        });
    }

    if select_items.is_empty() {
        return Ok(WidePivotPlan { sql: None, columns });
    }

    let (group_by, order_by) = if row_dims.is_empty() {
        (None, "1".to_string())
    } else {
        let dims = dims_list(row_dims);
        (Some(format!("GROUP BY {dims}")), dims)
    };

    let sql = assemble(vec![
        Some(format!("SELECT {}", select_items.join(", "))),
        Some(format!("FROM {relation}")),
        where_clause(&request.pivot.where_sql),
        group_by,
        Some(format!("ORDER BY {order_by}")),
        Some(format!("LIMIT {}", request.pivot.limit)),
    ]);

    Ok(WidePivotPlan {
        sql: Some(sql),
        columns,
    })
}
