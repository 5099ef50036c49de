//! Pivot execution against a [`QueryExecutor`].

use super::query::{
    distinct_count_sql, distinct_values_sql, long_pivot_sql, plan_wide_pivot,
    DISTINCT_VALUE_COLUMN,
};
use super::{PivotRequest, WidePivotRequest};
use crate::error::{PivotError, PivotResult};
use crate::executor::{QueryExecutor, ResultTable};

/// Run a long pivot over `relation`. Issues exactly one query.
pub async fn run_long_pivot<E>(
    executor: &E,
    relation: &str,
    request: &PivotRequest,
) -> PivotResult<ResultTable>
where
    E: QueryExecutor + ?Sized,
{
    let sql = long_pivot_sql(relation, request)?;
    log::debug!("long pivot query:\n{}", sql);
    executor.execute(&sql).await
}

fn check_ceiling(request: &WidePivotRequest, count: u64) -> PivotResult<()> {
    if count > request.max_distinct_cols {
        log::warn!(
            "wide pivot on {:?} rejected: {} distinct values (limit {})",
            request.col_dim,
            count,
            request.max_distinct_cols
        );
        return Err(PivotError::TooManyDistinctValues {
            count,
            max: request.max_distinct_cols,
        });
    }
    Ok(())
}

/// Run a wide pivot over `relation`.
///
/// The distinct count is checked against `max_distinct_cols` before the
/// values are fetched, so an oversized column dimension never reaches the
/// per-value query. The fetched value list is checked again before planning,
/// so the result never has more value columns than the ceiling.
pub async fn run_wide_pivot<E>(
    executor: &E,
    relation: &str,
    request: &WidePivotRequest,
) -> PivotResult<ResultTable>
where
    E: QueryExecutor + ?Sized,
{
    request.validate()?;
    let where_sql = &request.pivot.where_sql;

    let count = executor
        .execute(&distinct_count_sql(relation, &request.col_dim, where_sql))
        .await?
        .scalar_u64()?;
    check_ceiling(request, count)?;

    let distinct = executor
        .execute(&distinct_values_sql(relation, &request.col_dim, where_sql))
        .await?;
    let values = match distinct.column_index(DISTINCT_VALUE_COLUMN) {
        Some(idx) => distinct
            .rows
            .into_iter()
            .filter_map(|mut row| (idx < row.len()).then(|| row.swap_remove(idx)))
            .collect::<Vec<_>>(),
        None if distinct.rows.is_empty() => Vec::new(),
        None => {
            return Err(PivotError::UnexpectedResult(format!(
                "distinct values query returned no '{DISTINCT_VALUE_COLUMN}' column"
            )))
        }
    };

    // The engine's count and the fetched list can disagree; the list is what
    // becomes columns.
    check_ceiling(request, values.len() as u64)?;

    let plan = plan_wide_pivot(relation, request, &values)?;
    match plan.sql {
        Some(sql) => {
            log::debug!(
                "wide pivot query ({} value columns):\n{}",
                plan.columns.len(),
                sql
            );
            executor.execute(&sql).await
        }
        None => Ok(ResultTable::default()),
    }
}
