//! Database operations for `review_runs`, the per-run audit trail.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `review_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub window_end: NaiveDate,
    pub season: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: Option<Json<serde_json::Value>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, public_id, window_end, season, trigger_source, status, \
     started_at, completed_at, summary, error_message, created_at";

/// Creates a new review run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_review_run(
    pool: &PgPool,
    window_end: NaiveDate,
    season: &str,
    trigger_source: &str,
) -> Result<ReviewRunRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRunRow>(&format!(
        "INSERT INTO review_runs (public_id, window_end, season, trigger_source, status) \
         VALUES ($1, $2, $3, $4, 'queued') \
         RETURNING {COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(window_end)
    .bind(season)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `queued`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn start_review_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE review_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "queued",
        });
    }
    Ok(())
}

/// Marks a run as `succeeded` and stores its summary.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_review_run(
    pool: &PgPool,
    id: i64,
    summary: &serde_json::Value,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE review_runs \
         SET status = 'succeeded', completed_at = NOW(), summary = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(Json(summary))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunTransition`] if the run is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_review_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE review_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_review_run(pool: &PgPool, id: i64) -> Result<ReviewRunRow, DbError> {
    sqlx::query_as::<_, ReviewRunRow>(&format!(
        "SELECT {COLUMNS} FROM review_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
