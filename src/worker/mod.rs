//! Engine worker communication.
//!
//! Queries run in a long-lived worker process that embeds the analytical
//! engine. The library only produces SQL text and reads back rows, so the
//! engine stays a black box.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              csvpivot (Rust + Tokio)         │
//! │   PivotSession ─► WorkerExecutor ─► Client   │
//! └──────────────────────────────────────────────┘
//!                stdin (NDJSON) │ stdout (NDJSON)
//!                               ▼
//! ┌──────────────────────────────────────────────┐
//! │        pivot worker (DuckDB, query.execute)  │
//! └──────────────────────────────────────────────┘
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::{WorkerClient, DEFAULT_TIMEOUT_SECS};
pub use error::{WorkerError, WorkerResult};
