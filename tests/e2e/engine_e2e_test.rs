//! End-to-end tests against an in-process DuckDB engine.

#[path = "../common/engine.rs"]
mod engine;
#[path = "scenarios.rs"]
mod scenarios;

use csvpivot::source::UploadStore;
use csvpivot::PivotSession;
use engine::DuckDbExecutor;

async fn connect() -> PivotSession<DuckDbExecutor> {
    PivotSession::establish(DuckDbExecutor::open_in_memory(), UploadStore::new().unwrap(), 1)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_long_pivot_sums_by_region() {
    scenarios::long_pivot_sums_by_region(&connect().await).await;
}

#[tokio::test]
async fn test_wide_pivot_grand_total() {
    scenarios::wide_pivot_grand_total(&connect().await).await;
}

#[tokio::test]
async fn test_wide_count_fills_missing_cells_with_zero() {
    scenarios::wide_count_fills_missing_cells_with_zero(&connect().await).await;
}

#[tokio::test]
async fn test_null_value_counts_against_ceiling() {
    scenarios::null_value_counts_against_ceiling(&connect().await).await;
}

#[tokio::test]
async fn test_contains_filter_keeps_only_matches() {
    scenarios::contains_filter_keeps_only_matches(&connect().await).await;
}

#[tokio::test]
async fn test_malformed_numeric_literal_matches_nothing() {
    scenarios::malformed_numeric_literal_matches_nothing(&connect().await).await;
}

#[tokio::test]
async fn test_awkward_column_names_round_trip() {
    scenarios::awkward_column_names_round_trip(&connect().await).await;
}

#[tokio::test]
async fn test_engine_rejection_is_query_failure() {
    scenarios::engine_rejection_is_query_failure(&connect().await).await;
}

#[tokio::test]
async fn test_describe_reports_engine_types() {
    let session = connect().await;
    let source = csvpivot::source::TabularSource::upload(
        "types.csv",
        b"qty,price,day,flag\n1,2.5,2024-01-31,true\n".to_vec(),
    );

    let types = session.column_types(&source).await.unwrap();

    assert_eq!(types["qty"], "BIGINT");
    assert_eq!(types["price"], "DOUBLE");
    assert_eq!(types["day"], "DATE");
    assert_eq!(types["flag"], "BOOLEAN");
}
