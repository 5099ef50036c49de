//! Filter operator vocabulary.

use std::fmt;
use std::str::FromStr;

use crate::error::PivotError;

/// The operators a filter may use. Any other token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
    Contains,
    StartsWith,
    EndsWith,
    IsNull,
    NotNull,
}

impl FilterOp {
    /// Every operator, in the order a picker would list them.
    pub const ALL: [FilterOp; 11] = [
        FilterOp::Eq,
        FilterOp::NotEq,
        FilterOp::Gt,
        FilterOp::GtEq,
        FilterOp::Lt,
        FilterOp::LtEq,
        FilterOp::Contains,
        FilterOp::StartsWith,
        FilterOp::EndsWith,
        FilterOp::IsNull,
        FilterOp::NotNull,
    ];

    /// Wire token for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Gt => ">",
            FilterOp::GtEq => ">=",
            FilterOp::Lt => "<",
            FilterOp::LtEq => "<=",
            FilterOp::Contains => "contains",
            FilterOp::StartsWith => "startswith",
            FilterOp::EndsWith => "endswith",
            FilterOp::IsNull => "is_null",
            FilterOp::NotNull => "not_null",
        }
    }

    /// SQL comparison operator, for the six comparison variants.
    pub fn comparison_sql(&self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => Some("="),
            FilterOp::NotEq => Some("!="),
            FilterOp::Gt => Some(">"),
            FilterOp::GtEq => Some(">="),
            FilterOp::Lt => Some("<"),
            FilterOp::LtEq => Some("<="),
            _ => None,
        }
    }

    /// Operators that ignore the filter value.
    pub fn is_null_check(&self) -> bool {
        matches!(self, FilterOp::IsNull | FilterOp::NotNull)
    }
}

impl FromStr for FilterOp {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| PivotError::UnsupportedOperator(s.to_string()))
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
