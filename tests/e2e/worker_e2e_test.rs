//! End-to-end tests against a real engine worker.
//!
//! These run only when `CSVPIVOT_WORKER` points at a worker binary; otherwise
//! each test returns early. The same scenarios run in-process in
//! `engine_e2e_test`.

#[path = "scenarios.rs"]
mod scenarios;

use csvpivot::config::Settings;
use csvpivot::executor::WorkerExecutor;
use csvpivot::PivotSession;

async fn connect() -> Option<PivotSession<WorkerExecutor>> {
    if std::env::var("CSVPIVOT_WORKER").is_err() {
        println!("Skipping test: CSVPIVOT_WORKER not set");
        return None;
    }
    let mut settings = Settings::default();
    settings.pivot.threads = Some(1);
    Some(PivotSession::connect(&settings).await.unwrap())
}

#[tokio::test]
async fn test_long_pivot_sums_by_region() {
    let Some(session) = connect().await else { return };
    scenarios::long_pivot_sums_by_region(&session).await;
}

#[tokio::test]
async fn test_wide_pivot_grand_total() {
    let Some(session) = connect().await else { return };
    scenarios::wide_pivot_grand_total(&session).await;
}

#[tokio::test]
async fn test_wide_count_fills_missing_cells_with_zero() {
    let Some(session) = connect().await else { return };
    scenarios::wide_count_fills_missing_cells_with_zero(&session).await;
}

#[tokio::test]
async fn test_null_value_counts_against_ceiling() {
    let Some(session) = connect().await else { return };
    scenarios::null_value_counts_against_ceiling(&session).await;
}

#[tokio::test]
async fn test_contains_filter_keeps_only_matches() {
    let Some(session) = connect().await else { return };
    scenarios::contains_filter_keeps_only_matches(&session).await;
}

#[tokio::test]
async fn test_malformed_numeric_literal_matches_nothing() {
    let Some(session) = connect().await else { return };
    scenarios::malformed_numeric_literal_matches_nothing(&session).await;
}

#[tokio::test]
async fn test_awkward_column_names_round_trip() {
    let Some(session) = connect().await else { return };
    scenarios::awkward_column_names_round_trip(&session).await;
}

#[tokio::test]
async fn test_engine_rejection_is_query_failure() {
    let Some(session) = connect().await else { return };
    scenarios::engine_rejection_is_query_failure(&session).await;
}
