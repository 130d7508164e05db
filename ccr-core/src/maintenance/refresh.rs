//! Materialized-view refresh.
//!
//! Every refresh attempt is bracketed by a refresh-log row: RUNNING at
//! start, then SUCCESS with the row count or FAILED with the error text.
//! The log is the only evidence of refresh history and drives staleness
//! reporting. A failed view never aborts the remaining views of a
//! refresh-all pass.

use crate::entities::RefreshLogEntry;
use ccr_sdk::admin::{
    RefreshAllResponse, RefreshOutcome, RefreshStatus, ViewStatus, ViewStatusResponse,
};
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::{error, info};

/// The registered materialized views, in refresh order.
pub const REGISTERED_VIEWS: [&str; 4] = [
    "mv_trades_daily",
    "mv_issuance_daily",
    "mv_payments_daily",
    "mv_user_activity_daily",
];

/// A view whose last successful refresh is older than this is stale,
/// even if a refresh is currently pending.
pub const STALENESS_THRESHOLD: Duration = Duration::hours(2);

/// Refresh-log rows retained per view by the cleanup job.
pub const REFRESH_LOG_KEEP_PER_VIEW: i64 = 100;

/// How a refresh interacts with concurrent readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Plain `REFRESH MATERIALIZED VIEW`: faster, blocks readers.
    Blocking,
    /// `REFRESH ... CONCURRENTLY`: slower, readers keep the old snapshot.
    Concurrent,
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The name is not a registered view. Also guards the SQL identifier
    /// interpolation below: only names from [`REGISTERED_VIEWS`] reach it.
    #[error("unknown materialized view: {0}")]
    UnknownView(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Refresh one registered view.
///
/// A rebuild failure is reported inside the returned outcome (and the
/// FAILED log row), not as an `Err`; `Err` is reserved for an unknown
/// view name or a failure to write the log itself.
pub async fn refresh_view(
    pool: &PgPool,
    view_name: &str,
    mode: RefreshMode,
) -> Result<RefreshOutcome, RefreshError> {
    if !REGISTERED_VIEWS.contains(&view_name) {
        return Err(RefreshError::UnknownView(view_name.to_owned()));
    }

    let started_at = OffsetDateTime::now_utc();
    let log_id = RefreshLogEntry::begin(pool, view_name, started_at).await?;

    let refresh_sql = match mode {
        RefreshMode::Blocking => format!("REFRESH MATERIALIZED VIEW {view_name}"),
        RefreshMode::Concurrent => format!("REFRESH MATERIALIZED VIEW CONCURRENTLY {view_name}"),
    };

    match sqlx::query(&refresh_sql).execute(pool).await {
        Ok(_) => {
            let row_count: i64 = sqlx::query_scalar(&format!("SELECT count(*) FROM {view_name}"))
                .fetch_one(pool)
                .await?;
            let completed_at = OffsetDateTime::now_utc();
            RefreshLogEntry::complete_success(pool, log_id, completed_at, row_count).await?;

            let duration_ms = (completed_at - started_at).whole_milliseconds() as i64;
            info!(
                view = view_name,
                rows = row_count,
                duration_ms,
                "materialized view refreshed"
            );
            Ok(RefreshOutcome {
                view_name: view_name.to_owned(),
                status: RefreshStatus::Success,
                duration_ms,
                rows_affected: Some(row_count),
                error_message: None,
            })
        }
        Err(err) => {
            let completed_at = OffsetDateTime::now_utc();
            let message = err.to_string();
            RefreshLogEntry::complete_failure(pool, log_id, completed_at, &message).await?;

            error!(view = view_name, error = %message, "materialized view refresh failed");
            Ok(RefreshOutcome {
                view_name: view_name.to_owned(),
                status: RefreshStatus::Failed,
                duration_ms: (completed_at - started_at).whole_milliseconds() as i64,
                rows_affected: None,
                error_message: Some(message),
            })
        }
    }
}

/// Refresh every registered view, tolerating per-view failure.
pub async fn refresh_all(pool: &PgPool, mode: RefreshMode) -> RefreshAllResponse {
    let started_at = OffsetDateTime::now_utc();
    let mut outcomes = Vec::with_capacity(REGISTERED_VIEWS.len());

    for view_name in REGISTERED_VIEWS {
        match refresh_view(pool, view_name, mode).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(err) => {
                // Log bookkeeping failed; record the failure and move on to
                // the next view.
                error!(view = view_name, error = %err, "refresh bookkeeping failed");
                outcomes.push(RefreshOutcome {
                    view_name: view_name.to_owned(),
                    status: RefreshStatus::Failed,
                    duration_ms: 0,
                    rows_affected: None,
                    error_message: Some(err.to_string()),
                });
            }
        }
    }

    RefreshAllResponse {
        outcomes,
        duration_ms: (OffsetDateTime::now_utc() - started_at).whole_milliseconds() as i64,
    }
}

/// Freshness snapshot of every registered view.
pub async fn view_status(pool: &PgPool) -> Result<ViewStatusResponse, RefreshError> {
    let checked_at = OffsetDateTime::now_utc();
    let mut views = Vec::with_capacity(REGISTERED_VIEWS.len());

    for view_name in REGISTERED_VIEWS {
        let row_count: i64 = sqlx::query_scalar(&format!("SELECT count(*) FROM {view_name}"))
            .fetch_one(pool)
            .await?;
        let last_refresh = RefreshLogEntry::last_successful_completion(pool, view_name).await?;
        views.push(ViewStatus {
            view_name: view_name.to_owned(),
            row_count,
            last_refresh,
            hours_since_refresh: last_refresh.map(|at| (checked_at - at).whole_hours()),
            is_stale: is_stale(last_refresh, checked_at),
        });
    }

    Ok(ViewStatusResponse { views, checked_at })
}

/// Staleness rule: never successfully refreshed, or the last success is
/// older than [`STALENESS_THRESHOLD`].
pub fn is_stale(last_refresh: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match last_refresh {
        None => true,
        Some(at) => now - at > STALENESS_THRESHOLD,
    }
}

/// Prune the refresh log to its retention bound.
pub async fn prune_refresh_log(pool: &PgPool) -> Result<u64, RefreshError> {
    let deleted = RefreshLogEntry::prune(pool, REFRESH_LOG_KEEP_PER_VIEW).await?;
    if deleted > 0 {
        info!(deleted, "pruned old refresh log entries");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn never_refreshed_is_stale() {
        assert!(is_stale(None, datetime!(2024-03-14 12:00:00 UTC)));
    }

    #[test]
    fn staleness_threshold_is_two_hours() {
        let now = datetime!(2024-03-14 12:00:00 UTC);
        assert!(!is_stale(Some(datetime!(2024-03-14 10:01:00 UTC)), now));
        assert!(!is_stale(Some(datetime!(2024-03-14 10:00:00 UTC)), now));
        assert!(is_stale(Some(datetime!(2024-03-14 09:59:59 UTC)), now));
    }
}
