// tests/session/session_test.rs
#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{scalar, table, ScriptedExecutor};
use csvpivot::executor::{QueryExecutor, ResultTable};
use csvpivot::pivot::{Aggregation, PivotRequest};
use csvpivot::source::{SourceDescriptor, TabularSource, UploadStore};
use csvpivot::{PivotError, PivotResult, PivotSession};
use serde_json::json;

fn describe_result() -> ResultTable {
    table(
        &["column_name", "column_type", "null", "key", "default", "extra"],
        vec![
            vec![json!("region"), json!("VARCHAR"), json!("YES"), json!(null), json!(null), json!(null)],
            vec![json!("qty"), json!("BIGINT"), json!("YES"), json!(null), json!(null), json!(null)],
        ],
    )
}

async fn new_session() -> PivotSession<ScriptedExecutor> {
    PivotSession::establish(ScriptedExecutor::new(), UploadStore::new().unwrap(), 2)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_establish_sends_thread_hint_once() {
    let session = PivotSession::establish(ScriptedExecutor::new(), UploadStore::new().unwrap(), 4)
        .await
        .unwrap();

    assert_eq!(session.threads(), 4);
    assert_eq!(session.executor().queries(), vec!["PRAGMA threads=4"]);
}

#[tokio::test]
async fn test_zero_threads_clamped_to_one() {
    let session = PivotSession::establish(ScriptedExecutor::new(), UploadStore::new().unwrap(), 0)
        .await
        .unwrap();

    assert_eq!(session.threads(), 1);
    assert_eq!(session.executor().queries(), vec!["PRAGMA threads=1"]);
}

#[tokio::test]
async fn test_failed_thread_hint_fails_establish() {
    let executor = ScriptedExecutor::new().respond(Err(PivotError::query_failed("no pragma")));
    let result = PivotSession::establish(executor, UploadStore::new().unwrap(), 2).await;
    assert!(matches!(result, Err(PivotError::QueryExecutionFailure { .. })));
}

#[tokio::test]
async fn test_describe_and_column_types() {
    let executor = ScriptedExecutor::new()
        .respond_table(ResultTable::default())
        .respond_table(describe_result())
        .respond_table(describe_result());
    let session = PivotSession::establish(executor, UploadStore::new().unwrap(), 2)
        .await
        .unwrap();
    let source = TabularSource::path("/data/sales.csv");

    let columns = session.describe_columns(&source).await.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[1].name, "qty");
    assert_eq!(columns[1].raw_type, "BIGINT");

    let types = session.column_types(&source).await.unwrap();
    assert_eq!(types.get("region").map(String::as_str), Some("VARCHAR"));

    assert_eq!(
        session.executor().queries()[1],
        "DESCRIBE SELECT * FROM read_csv_auto('/data/sales.csv')"
    );
}

#[tokio::test]
async fn test_malformed_describe_is_unexpected() {
    let executor = ScriptedExecutor::new()
        .respond_table(ResultTable::default())
        .respond_table(scalar(json!(1)));
    let session = PivotSession::establish(executor, UploadStore::new().unwrap(), 2)
        .await
        .unwrap();

    let err = session
        .describe_columns(&TabularSource::path("/data/sales.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, PivotError::UnexpectedResult(_)));
}

#[tokio::test]
async fn test_preview_is_unfiltered_and_limited() {
    let session = new_session().await;

    session
        .preview(&TabularSource::path("/data/sales.csv"), 50)
        .await
        .unwrap();

    assert_eq!(
        session.executor().queries()[1],
        "SELECT * FROM read_csv_auto('/data/sales.csv') LIMIT 50"
    );
}

#[tokio::test]
async fn test_upload_materialized_once_across_requests() {
    let session = new_session().await;
    let source = TabularSource::upload("sales.csv", b"region,qty\neast,5\nwest,3\neast,2\n".to_vec());
    let request = PivotRequest::new(["region"], "qty", Aggregation::Sum);

    session.run_long_pivot(&source, &request).await.unwrap();
    session.run_long_pivot(&source, &request).await.unwrap();

    assert_eq!(session.uploads().len(), 1);
    let queries = session.executor().queries();
    let relation_of = |sql: &str| sql.lines().nth(1).unwrap_or_default().to_string();
    assert_eq!(relation_of(&queries[1]), relation_of(&queries[2]));

    let dir = session.uploads().dir().to_string_lossy().replace('\\', "/");
    assert!(queries[1].contains(&dir), "{}", queries[1]);
}

#[tokio::test]
async fn test_resolve_relation_for_uploads() {
    let session = new_session().await;
    let relation = session
        .resolve_relation(&TabularSource::upload("a.csv", b"x\n1\n".to_vec()))
        .await
        .unwrap();
    assert!(relation.starts_with("read_csv_auto('"));
    assert!(relation.ends_with(".csv')"));
}

#[tokio::test]
async fn test_concurrent_upload_resolution_writes_once() {
    let session = new_session().await;
    let source = TabularSource::upload("big.csv", b"region,qty\n".repeat(50_000));

    let (a, b, c) = tokio::join!(
        session.resolve_relation(&source),
        session.resolve_relation(&source),
        session.resolve_relation(&source),
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(session.uploads().len(), 1);
    assert_eq!(std::fs::read_dir(session.uploads().dir()).unwrap().count(), 1);
}

#[test]
fn test_upload_descriptor_without_bytes() {
    let descriptor: SourceDescriptor =
        serde_json::from_str(r#"{"kind": "upload", "name": "sales.csv"}"#).unwrap();
    let err = TabularSource::try_from(descriptor).unwrap_err();
    assert!(matches!(err, PivotError::MissingUpload { ref name } if name == "sales.csv"));
    assert!(err.is_user_error());
}

/// Executor that records how many queries overlap in time.
#[derive(Default)]
struct OverlapTracker {
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl QueryExecutor for OverlapTracker {
    async fn execute(&self, _sql: &str) -> PivotResult<ResultTable> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(ResultTable::default())
    }
}

#[tokio::test]
async fn test_requests_on_one_session_do_not_overlap() {
    let session = PivotSession::establish(OverlapTracker::default(), UploadStore::new().unwrap(), 2)
        .await
        .unwrap();
    let source = TabularSource::path("/data/sales.csv");
    let long = PivotRequest::new(["region"], "qty", Aggregation::Sum);
    let wide = long.clone().wide("product");

    let (a, b, c) = tokio::join!(
        session.run_long_pivot(&source, &long),
        session.run_wide_pivot(&source, &wide),
        session.preview(&source, 10),
    );

    // The wide pivot reads an empty count table, which is not a number.
    assert!(a.is_ok());
    assert!(matches!(b, Err(PivotError::UnexpectedResult(_))));
    assert!(c.is_ok());
    assert_eq!(session.executor().peak.load(Ordering::SeqCst), 1);
}
