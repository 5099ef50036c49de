//! Query execution seam.
//!
//! The synthesizer only needs "run this SQL and give me rows back". The
//! [`QueryExecutor`] trait is that contract; [`WorkerExecutor`] fulfils it by
//! forwarding to the engine worker, and tests substitute recording fakes.

mod worker;

pub use worker::WorkerExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PivotError, PivotResult};
use crate::worker::protocol::{ExecuteQueryResponse, QueryResultColumn};

/// Column of a [`ResultTable`].
pub type ResultColumn = QueryResultColumn;

/// Executes SQL text against the analytical engine.
///
/// Implementations run one statement at a time and report engine rejections
/// as [`PivotError::QueryExecutionFailure`].
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> PivotResult<ResultTable>;
}

/// Ordered rows of ordered, named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ResultTable {
    pub fn new(columns: Vec<ResultColumn>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    /// Table with untyped columns, mostly for tests and fakes.
    pub fn from_names<I, S>(names: I, rows: Vec<Vec<serde_json::Value>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .map(|name| ResultColumn {
                name: name.into(),
                data_type: String::new(),
            })
            .collect();
        Self { columns, rows }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&serde_json::Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().filter_map(|row| row.get(idx)).collect())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First cell of the first row, read as a non-negative integer.
    ///
    /// Count queries come back as a single cell. Engines may encode large
    /// integers as numbers or strings, so both are accepted.
    pub fn scalar_u64(&self) -> PivotResult<u64> {
        let cell = self
            .rows
            .first()
            .and_then(|row| row.first())
            .ok_or_else(|| PivotError::UnexpectedResult("expected a scalar, got no rows".into()))?;

        let parsed = match cell {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| {
            PivotError::UnexpectedResult(format!("expected a non-negative count, got {cell}"))
        })
    }
}

impl From<ExecuteQueryResponse> for ResultTable {
    fn from(resp: ExecuteQueryResponse) -> Self {
        Self {
            columns: resp.columns,
            rows: resp.rows,
        }
    }
}
