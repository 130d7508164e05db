use axum::{Json, extract::Query, response::IntoResponse};
use ccr_core::entities::refresh_log::GetRefreshHistory;
use kanau::processor::Processor;
use serde::Deserialize;

use crate::state::AppState;

use super::AdminApiError;

const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    /// Restrict to one view; absent means all views.
    view: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// `GET /views/refresh-history` — refresh attempts, newest first.
pub async fn refresh_history(
    state: axum::extract::State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let entries = state
        .db_processor()
        .process(GetRefreshHistory {
            view_name: query.view,
            limit: query.limit.clamp(1, MAX_HISTORY_LIMIT),
        })
        .await
        .map_err(AdminApiError::Database)?;
    Ok(Json(entries))
}
