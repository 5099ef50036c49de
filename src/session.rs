//! Pivot session: one engine connection plus the uploads it has seen.
//!
//! A session is created once per application instance and passed to every
//! call. It owns the executor and the [`UploadStore`], applies the engine
//! thread hint once at establishment, and serializes pivot requests so only
//! one query chain is in flight at a time.
//!
//! # Example
//!
//! ```ignore
//! use csvpivot::prelude::*;
//!
//! let settings = Settings::load()?;
//! let session = PivotSession::connect(&settings).await?;
//!
//! let source = TabularSource::path("sales.csv");
//! let types = session.column_types(&source).await?;
//! let where_sql = build_where(&[FilterSpec::new("region", "contains", "es")], &types)?;
//!
//! let request = PivotRequest::new(["region"], "qty", Aggregation::Sum).with_where(where_sql);
//! let table = session.run_long_pivot(&source, &request).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Settings;
use crate::error::{PivotError, PivotResult};
use crate::executor::{QueryExecutor, ResultTable, WorkerExecutor};
use crate::pivot::{self, PivotRequest, WidePivotRequest};
use crate::source::{self, ColumnDescriptor, TabularSource, UploadStore};
use crate::worker::WorkerClient;

/// Explicitly owned engine session.
pub struct PivotSession<E: QueryExecutor> {
    executor: E,
    uploads: Arc<UploadStore>,
    threads: usize,
    in_flight: Mutex<()>,
}

impl PivotSession<WorkerExecutor> {
    /// Spawn the configured worker and establish a session on it.
    pub async fn connect(settings: &Settings) -> PivotResult<Self> {
        let connection = settings.worker.connection_params()?;
        let client = WorkerClient::spawn_with_settings(settings).await?;
        let executor = WorkerExecutor::new(client, connection);
        Self::establish(executor, UploadStore::new()?, settings.pivot.effective_threads()).await
    }
}

impl<E: QueryExecutor> PivotSession<E> {
    /// Establish a session on `executor`, issuing the engine thread hint.
    pub async fn establish(executor: E, uploads: UploadStore, threads: usize) -> PivotResult<Self> {
        let threads = threads.max(1);
        executor
            .execute(&format!("PRAGMA threads={threads}"))
            .await?;
        log::info!("pivot session established ({} engine threads)", threads);

        Ok(Self {
            executor,
            uploads: Arc::new(uploads),
            threads,
            in_flight: Mutex::new(()),
        })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Relation expression for `source`; uploads are materialized once per content.
    ///
    /// Hashing and writing an upload run on the blocking pool.
    pub async fn resolve_relation(&self, source: &TabularSource) -> PivotResult<String> {
        if let TabularSource::Path(_) = source {
            return source::resolve_relation(source, &self.uploads);
        }

        let uploads = Arc::clone(&self.uploads);
        let owned = source.clone();
        tokio::task::spawn_blocking(move || source::resolve_relation(&owned, &uploads))
            .await
            .map_err(|e| PivotError::Io(std::io::Error::other(e)))?
    }

    /// Columns of `source` with their engine types.
    pub async fn describe_columns(
        &self,
        source: &TabularSource,
    ) -> PivotResult<Vec<ColumnDescriptor>> {
        let relation = self.resolve_relation(source).await?;
        let _guard = self.in_flight.lock().await;
        source::describe_columns(&self.executor, &relation).await
    }

    /// Column name to raw type map, as [`build_where`](crate::filter::build_where) expects.
    pub async fn column_types(&self, source: &TabularSource) -> PivotResult<HashMap<String, String>> {
        Ok(self
            .describe_columns(source)
            .await?
            .into_iter()
            .map(|c| (c.name, c.raw_type))
            .collect())
    }

    /// First `rows` rows of `source`, unfiltered.
    pub async fn preview(&self, source: &TabularSource, rows: u64) -> PivotResult<ResultTable> {
        let relation = self.resolve_relation(source).await?;
        let _guard = self.in_flight.lock().await;
        self.executor
            .execute(&format!("SELECT * FROM {relation} LIMIT {rows}"))
            .await
    }

    pub async fn run_long_pivot(
        &self,
        source: &TabularSource,
        request: &PivotRequest,
    ) -> PivotResult<ResultTable> {
        let relation = self.resolve_relation(source).await?;
        let _guard = self.in_flight.lock().await;
        pivot::run_long_pivot(&self.executor, &relation, request).await
    }

    pub async fn run_wide_pivot(
        &self,
        source: &TabularSource,
        request: &WidePivotRequest,
    ) -> PivotResult<ResultTable> {
        let relation = self.resolve_relation(source).await?;
        let _guard = self.in_flight.lock().await;
        pivot::run_wide_pivot(&self.executor, &relation, request).await
    }
}
