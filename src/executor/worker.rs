//! QueryExecutor backed by the engine worker.

use async_trait::async_trait;

use super::{QueryExecutor, ResultTable};
use crate::error::PivotResult;
use crate::worker::protocol::ConnectionParams;
use crate::worker::WorkerClient;

/// Runs queries through a [`WorkerClient`] against one engine connection.
///
/// # Example
///
/// ```ignore
/// use csvpivot::executor::WorkerExecutor;
/// use csvpivot::worker::{WorkerClient, protocol::ConnectionParams};
///
/// let client = WorkerClient::spawn("./pivot-worker").await?;
/// let executor = WorkerExecutor::new(client, ConnectionParams::duckdb_in_memory());
/// ```
pub struct WorkerExecutor {
    client: WorkerClient,
    connection: ConnectionParams,
}

impl WorkerExecutor {
    pub fn new(client: WorkerClient, connection: ConnectionParams) -> Self {
        Self { client, connection }
    }
}

#[async_trait]
impl QueryExecutor for WorkerExecutor {
    async fn execute(&self, sql: &str) -> PivotResult<ResultTable> {
        log::debug!("executing: {}", sql);
        let response = self.client.execute_query(&self.connection, sql).await?;
        Ok(response.into())
    }
}
