//! Materialized-view refresh log.
//!
//! One row per refresh attempt. A row is inserted as RUNNING before the
//! rebuild starts and transitions to SUCCESS or FAILED on the same id;
//! this log is the only evidence of refresh history and drives staleness
//! reporting.

use crate::framework::DatabaseProcessor;
use ccr_sdk::admin::{RefreshHistoryEntry, RefreshStatus};
use kanau::processor::Processor;
use time::OffsetDateTime;

/// A raw refresh-log row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshLogEntry {
    pub id: i64,
    pub mv_name: String,
    pub refresh_started_at: OffsetDateTime,
    pub refresh_completed_at: Option<OffsetDateTime>,
    pub status: String,
    pub rows_affected: Option<i64>,
    pub error_message: Option<String>,
}

impl RefreshLogEntry {
    /// Open a RUNNING entry for a refresh attempt, returning its id.
    pub async fn begin(
        pool: &sqlx::PgPool,
        view_name: &str,
        started_at: OffsetDateTime,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO mv_refresh_log (mv_name, refresh_started_at, status)
            VALUES ($1, $2, 'RUNNING')
            RETURNING id
            "#,
        )
        .bind(view_name)
        .bind(started_at)
        .fetch_one(pool)
        .await
    }

    /// Transition a RUNNING entry to SUCCESS with the refreshed row count.
    pub async fn complete_success(
        pool: &sqlx::PgPool,
        id: i64,
        completed_at: OffsetDateTime,
        rows_affected: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE mv_refresh_log
            SET refresh_completed_at = $2, status = 'SUCCESS', rows_affected = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(completed_at)
        .bind(rows_affected)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition a RUNNING entry to FAILED with the error text.
    pub async fn complete_failure(
        pool: &sqlx::PgPool,
        id: i64,
        completed_at: OffsetDateTime,
        error_message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE mv_refresh_log
            SET refresh_completed_at = $2, status = 'FAILED', error_message = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(completed_at)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Completion time of the most recent successful refresh of a view.
    pub async fn last_successful_completion(
        pool: &sqlx::PgPool,
        view_name: &str,
    ) -> Result<Option<OffsetDateTime>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT max(refresh_completed_at) FROM mv_refresh_log
            WHERE mv_name = $1 AND status = 'SUCCESS'
            "#,
        )
        .bind(view_name)
        .fetch_one(pool)
        .await
    }

    /// Delete old entries, retaining the `keep_per_view` most recent rows
    /// of every view. Returns the number of rows removed.
    pub async fn prune(pool: &sqlx::PgPool, keep_per_view: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM mv_refresh_log
            WHERE id IN (
                SELECT id FROM (
                    SELECT id,
                           row_number() OVER (
                               PARTITION BY mv_name
                               ORDER BY refresh_started_at DESC
                           ) AS rn
                    FROM mv_refresh_log
                ) ranked
                WHERE rn > $1
            )
            "#,
        )
        .bind(keep_per_view)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
/// Fetch refresh history, newest first, optionally scoped to one view.
pub struct GetRefreshHistory {
    pub view_name: Option<String>,
    pub limit: i64,
}

impl Processor<GetRefreshHistory> for DatabaseProcessor {
    type Output = Vec<RefreshHistoryEntry>;
    type Error = sqlx::Error;

    #[tracing::instrument(skip_all, err, name = "SQL:GetRefreshHistory")]
    async fn process(
        &self,
        query: GetRefreshHistory,
    ) -> Result<Vec<RefreshHistoryEntry>, sqlx::Error> {
        let rows: Vec<RefreshLogEntry> = sqlx::query_as(
            r#"
            SELECT id, mv_name, refresh_started_at, refresh_completed_at,
                   status, rows_affected, error_message
            FROM mv_refresh_log
            WHERE ($1::text IS NULL OR mv_name = $1)
            ORDER BY refresh_started_at DESC
            LIMIT $2
            "#,
        )
        .bind(&query.view_name)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(history_entry).collect())
    }
}

fn history_entry(row: RefreshLogEntry) -> RefreshHistoryEntry {
    let duration_seconds = row
        .refresh_completed_at
        .map(|done| (done - row.refresh_started_at).as_seconds_f64());
    RefreshHistoryEntry {
        view_name: row.mv_name,
        started_at: row.refresh_started_at,
        completed_at: row.refresh_completed_at,
        status: RefreshStatus::from_tag(&row.status),
        rows_affected: row.rows_affected,
        duration_seconds,
        error_message: row.error_message,
    }
}
