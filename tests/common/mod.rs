//! Shared fakes for integration tests.
//!
//! [`ScriptedExecutor`] plays back queued results in order and records every
//! SQL statement it receives, so tests can assert on both the exact query
//! text and the number of queries issued.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use csvpivot::executor::{QueryExecutor, ResultTable};
use csvpivot::PivotResult;
use serde_json::Value;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

pub const REL: &str = "read_csv_auto('/data/sales.csv')";

#[derive(Default)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<PivotResult<ResultTable>>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next unanswered query.
    pub fn respond(self, result: PivotResult<ResultTable>) -> Self {
        self.responses.lock().unwrap().push_back(result);
        self
    }

    pub fn respond_table(self, table: ResultTable) -> Self {
        self.respond(Ok(table))
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, sql: &str) -> PivotResult<ResultTable> {
        self.queries.lock().unwrap().push(sql.to_string());
        // Unscripted queries get an empty table.
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ResultTable::default()))
    }
}

pub fn table(names: &[&str], rows: Vec<Vec<Value>>) -> ResultTable {
    ResultTable::from_names(names.iter().copied(), rows)
}

/// Single-cell result, as returned by a count query.
pub fn scalar(value: Value) -> ResultTable {
    table(&["count"], vec![vec![value]])
}

/// Result of a distinct-values query.
pub fn distinct(values: Vec<Value>) -> ResultTable {
    table(&["v"], values.into_iter().map(|v| vec![v]).collect())
}

/// Assert that `sql` parses as a single DuckDB statement.
pub fn assert_parses(sql: &str) {
    let statements = Parser::parse_sql(&DuckDbDialect {}, sql)
        .unwrap_or_else(|e| panic!("generated SQL does not parse: {e}\n{sql}"));
    assert_eq!(statements.len(), 1, "expected one statement:\n{sql}");
}
