//! Pivot query synthesis.
//!
//! A pivot is described declaratively by a [`PivotRequest`] (long format) or a
//! [`WidePivotRequest`] (one output column per distinct value of a column
//! dimension). The [`query`] module turns requests into SQL text and the
//! [`run`] functions drive the engine through a
//! [`QueryExecutor`](crate::executor::QueryExecutor).
//!
//! Long pivots issue exactly one query. Wide pivots issue up to three, in
//! order: distinct count, distinct values, final aggregation.

pub mod alias;
pub mod query;
mod run;

pub use alias::{make_alias, AliasGenerator};
pub use query::{
    distinct_count_sql, distinct_values_sql, long_pivot_sql, plan_wide_pivot, WideColumn,
    WidePivotPlan,
};
pub use run::{run_long_pivot, run_wide_pivot};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, PivotResult};

/// Default result row cap.
pub const DEFAULT_LIMIT: u64 = 2_000;

/// Default distinct-value ceiling for wide pivots.
pub const DEFAULT_MAX_DISTINCT_COLS: u64 = 200;

/// Built-in aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Sum,
        Aggregation::Count,
        Aggregation::Avg,
        Aggregation::Min,
        Aggregation::Max,
    ];

    /// SQL function name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "SUM",
            Aggregation::Count => "COUNT",
            Aggregation::Avg => "AVG",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
        }
    }
}

impl FromStr for Aggregation {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Aggregation::ALL
            .iter()
            .copied()
            .find(|agg| agg.as_str() == upper)
            .ok_or_else(|| PivotError::UnsupportedAggregation(s.to_string()))
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Long-format pivot: one row per group with a single `value` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRequest {
    /// Grouping columns, in output order.
    pub row_dims: Vec<String>,
    /// Aggregated column. Ignored for COUNT.
    pub measure: String,
    pub aggregation: Aggregation,
    /// Predicate from [`build_where`](crate::filter::build_where); empty means no filtering.
    #[serde(default)]
    pub where_sql: String,
    /// Cap on output groups. All matching rows are still aggregated.
    pub limit: u64,
}

impl PivotRequest {
    pub fn new<I, S>(row_dims: I, measure: impl Into<String>, aggregation: Aggregation) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            row_dims: row_dims.into_iter().map(Into::into).collect(),
            measure: measure.into(),
            aggregation,
            where_sql: String::new(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_where(mut self, where_sql: impl Into<String>) -> Self {
        self.where_sql = where_sql.into();
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Turn this into a wide request over `col_dim`.
    pub fn wide(self, col_dim: impl Into<String>) -> WidePivotRequest {
        WidePivotRequest {
            pivot: self,
            col_dim: col_dim.into(),
            max_distinct_cols: DEFAULT_MAX_DISTINCT_COLS,
        }
    }

    pub(crate) fn validate_limit(&self) -> PivotResult<()> {
        if self.limit == 0 {
            return Err(PivotError::InvalidRequest(
                "limit must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// Wide-format pivot: one aggregate column per distinct value of `col_dim`.
///
/// `pivot.row_dims` may be empty, producing a single grand-total row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidePivotRequest {
    #[serde(flatten)]
    pub pivot: PivotRequest,
    pub col_dim: String,
    /// Ceiling on distinct values of `col_dim`, checked before any per-value work.
    pub max_distinct_cols: u64,
}

impl WidePivotRequest {
    pub fn with_max_distinct_cols(mut self, max: u64) -> Self {
        self.max_distinct_cols = max;
        self
    }

    pub(crate) fn validate(&self) -> PivotResult<()> {
        self.pivot.validate_limit()?;
        if self.max_distinct_cols == 0 {
            return Err(PivotError::InvalidRequest(
                "max_distinct_cols must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}
