//! # csvpivot
//!
//! Pivot query synthesis over CSV files.
//!
//! ## Architecture
//!
//! Declarative pivot requests are compiled to DuckDB SQL and executed by an
//! analytical engine running in a worker process:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │      Request (row dims, measure, aggregation, filters)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [filter::build_where]
//! ┌─────────────────────────────────────────────────────────┐
//! │          WHERE predicate (typed, TRY_CAST, ILIKE)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [pivot: long / wide synthesis]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 SQL over read_csv_auto(...)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor → worker]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      ResultTable                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [export]
//!                     CSV / .xlsx bytes
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod export;
pub mod filter;
pub mod pivot;
pub mod session;
pub mod source;
pub mod sql;
pub mod worker;

pub use error::{PivotError, PivotResult};
pub use executor::{QueryExecutor, ResultTable};
pub use filter::{build_where, FilterOp, FilterSpec};
pub use pivot::{run_long_pivot, run_wide_pivot, Aggregation, PivotRequest, WidePivotRequest};
pub use session::PivotSession;
pub use source::TabularSource;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::error::{PivotError, PivotResult};
    pub use crate::executor::{QueryExecutor, ResultTable, WorkerExecutor};
    pub use crate::export::{to_csv_bytes, to_xlsx_bytes};
    pub use crate::filter::{build_where, FilterOp, FilterSpec};
    pub use crate::pivot::{Aggregation, PivotRequest, WidePivotRequest};
    pub use crate::session::PivotSession;
    pub use crate::source::{SourceDescriptor, TabularSource, UploadStore};
}
