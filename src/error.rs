//! Error types for pivot synthesis and execution.

use thiserror::Error;

use crate::config::SettingsError;
use crate::worker::WorkerError;

/// Result type for pivot operations.
pub type PivotResult<T> = Result<T, PivotError>;

/// Errors raised while resolving sources, building predicates, or running pivots.
///
/// Every variant fails the whole pivot request; there is no partial-result mode.
#[derive(Error, Debug)]
pub enum PivotError {
    /// Filter operator outside the allowed vocabulary.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Aggregation name outside SUM/COUNT/AVG/MIN/MAX.
    #[error("unsupported aggregation: {0}")]
    UnsupportedAggregation(String),

    /// Wide pivot column dimension has more distinct values than allowed.
    #[error("column dimension has {count} distinct values; wide pivot is limited to {max}")]
    TooManyDistinctValues {
        /// Distinct values found under the active predicate.
        count: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// Upload source without a payload.
    #[error("upload source '{name}' is missing its bytes")]
    MissingUpload { name: String },

    /// Source that cannot be turned into a relation.
    #[error("cannot resolve source: {0}")]
    UnresolvedSource(String),

    /// Long pivots need at least one row dimension.
    #[error("at least one row dimension is required")]
    NoRowDimensions,

    /// Request parameters outside their valid range.
    #[error("invalid pivot request: {0}")]
    InvalidRequest(String),

    /// The engine rejected a generated query.
    #[error("query execution failed: {message}")]
    QueryExecutionFailure { message: String },

    /// The engine answered with a shape the synthesizer did not expect.
    #[error("unexpected query result: {0}")]
    UnexpectedResult(String),

    /// Transport failure talking to the engine worker.
    #[error(transparent)]
    Worker(WorkerError),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(#[from] SettingsError),

    /// Failure materializing an upload on disk.
    #[error("failed to materialize upload: {0}")]
    Io(#[from] std::io::Error),
}

impl PivotError {
    /// Create a query failure carrying the engine's message.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryExecutionFailure {
            message: message.into(),
        }
    }

    /// True for errors caused by user input rather than the engine or transport.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperator(_)
                | Self::UnsupportedAggregation(_)
                | Self::TooManyDistinctValues { .. }
                | Self::MissingUpload { .. }
                | Self::UnresolvedSource(_)
                | Self::NoRowDimensions
                | Self::InvalidRequest(_)
        )
    }
}

impl From<WorkerError> for PivotError {
    fn from(err: WorkerError) -> Self {
        match err {
            // The worker reports engine-side rejections as remote errors.
            WorkerError::Remote { code, message } if code != "WORKER_EXITED" => {
                Self::QueryExecutionFailure { message }
            }
            other => Self::Worker(other),
        }
    }
}
