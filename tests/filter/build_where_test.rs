// tests/filter/build_where_test.rs
#[path = "../common/mod.rs"]
mod common;

use std::collections::HashMap;

use common::assert_parses;
use csvpivot::filter::{build_where, FilterOp, FilterSpec};
use csvpivot::PivotError;

fn sales_types() -> HashMap<String, String> {
    [
        ("region", "VARCHAR"),
        ("qty", "BIGINT"),
        ("price", "DECIMAL(18,2)"),
        ("sold_on", "DATE"),
        ("opened_at", "TIME"),
        ("ts", "TIMESTAMP WITH TIME ZONE"),
        ("active", "BOOLEAN"),
        ("Sales Rep", "VARCHAR"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn where_for(filters: &[FilterSpec]) -> String {
    build_where(filters, &sales_types()).unwrap()
}

#[test]
fn test_no_filters_means_no_predicate() {
    assert_eq!(where_for(&[]), "");
}

#[test]
fn test_contains_is_case_insensitive_substring() {
    assert_eq!(
        where_for(&[FilterSpec::new("region", "contains", "es")]),
        "CAST(region AS VARCHAR) ILIKE '%' || 'es' || '%'"
    );
}

#[test]
fn test_starts_and_ends_with() {
    assert_eq!(
        where_for(&[FilterSpec::new("region", "startswith", "we")]),
        "CAST(region AS VARCHAR) ILIKE 'we%'"
    );
    assert_eq!(
        where_for(&[FilterSpec::new("region", "endswith", "st")]),
        "CAST(region AS VARCHAR) ILIKE '%st'"
    );
}

#[test]
fn test_pattern_wildcards_pass_through() {
    assert_eq!(
        where_for(&[FilterSpec::new("region", "contains", "a_b%")]),
        "CAST(region AS VARCHAR) ILIKE '%' || 'a_b%' || '%'"
    );
}

#[test]
fn test_numeric_malformed_literal_uses_try_cast() {
    assert_eq!(
        where_for(&[FilterSpec::new("qty", ">", "abc")]),
        "TRY_CAST(qty AS DOUBLE) > TRY_CAST('abc' AS DOUBLE)"
    );
}

#[test]
fn test_decimal_is_numeric() {
    assert_eq!(
        where_for(&[FilterSpec::new("price", "<=", "9.99")]),
        "TRY_CAST(price AS DOUBLE) <= TRY_CAST('9.99' AS DOUBLE)"
    );
}

#[test]
fn test_temporal_comparisons() {
    assert_eq!(
        where_for(&[FilterSpec::new("sold_on", ">=", "2024-01-01")]),
        "TRY_CAST(sold_on AS DATE) >= TRY_CAST('2024-01-01' AS DATE)"
    );
    assert_eq!(
        where_for(&[FilterSpec::new("opened_at", "<", "09:30")]),
        "TRY_CAST(opened_at AS TIME) < TRY_CAST('09:30' AS TIME)"
    );
    assert_eq!(
        where_for(&[FilterSpec::new("ts", "!=", "2024-01-01 10:00")]),
        "TRY_CAST(ts AS TIMESTAMP) != TRY_CAST('2024-01-01 10:00' AS TIMESTAMP)"
    );
}

#[test]
fn test_boolean_literals_and_fallback() {
    assert_eq!(
        where_for(&[FilterSpec::new("active", "=", "Yes")]),
        "CAST(active AS BOOLEAN) = TRUE"
    );
    assert_eq!(
        where_for(&[FilterSpec::new("active", "!=", "0")]),
        "CAST(active AS BOOLEAN) != FALSE"
    );
    assert_eq!(
        where_for(&[FilterSpec::new("active", "=", "maybe")]),
        "CAST(active AS VARCHAR) = 'maybe'"
    );
}

#[test]
fn test_unknown_column_is_text() {
    assert_eq!(
        where_for(&[FilterSpec::new("notes", "=", "x")]),
        "notes = 'x'"
    );
}

#[test]
fn test_quoting_of_names_and_values() {
    assert_eq!(
        where_for(&[FilterSpec::new("Sales Rep", "=", "O'Neil")]),
        "\"Sales Rep\" = 'O''Neil'"
    );
}

#[test]
fn test_clauses_join_in_order() {
    let sql = where_for(&[
        FilterSpec::new("region", "=", "east"),
        FilterSpec::new("", "=", "skipped"),
        FilterSpec::new("qty", "not_null", ""),
    ]);
    assert_eq!(sql, "region = 'east' AND qty IS NOT NULL");
}

#[test]
fn test_every_unknown_operator_is_rejected() {
    for token in ["like", "in", "between", "IS_NULL", "~"] {
        let err = build_where(&[FilterSpec::new("region", token, "x")], &sales_types())
            .unwrap_err();
        assert!(
            matches!(err, PivotError::UnsupportedOperator(ref t) if t == token),
            "{token} should be rejected"
        );
    }
}

#[test]
fn test_filter_spec_wire_format() {
    let filters: Vec<FilterSpec> =
        serde_json::from_str(r#"[{"col": "qty", "op": ">", "value": "3"}, {"col": "region"}]"#)
            .unwrap();
    assert_eq!(filters[0], FilterSpec::new("qty", ">", "3"));
    assert_eq!(filters[1].op, FilterOp::Eq.as_str());
    assert_eq!(filters[1].value, "");
}

#[test]
fn test_every_operator_yields_parseable_sql() {
    for op in FilterOp::ALL {
        for column in ["region", "qty", "sold_on", "active"] {
            let predicate = where_for(&[FilterSpec::new(column, op.as_str(), "1")]);
            assert_parses(&format!("SELECT * FROM sales WHERE {predicate}"));
        }
    }
}
