use axum::{Json, extract::Path, extract::Query, response::IntoResponse};
use ccr_core::maintenance::refresh::{self, RefreshMode};
use serde::Deserialize;

use crate::state::AppState;

use super::AdminApiError;

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshQuery {
    /// Use a non-blocking (CONCURRENTLY) refresh.
    #[serde(default)]
    concurrent: bool,
}

fn mode_for(query: &RefreshQuery) -> RefreshMode {
    if query.concurrent {
        RefreshMode::Concurrent
    } else {
        RefreshMode::Blocking
    }
}

/// `POST /views/{view_name}/refresh` — operator-triggered refresh of one view.
pub async fn refresh_one_view(
    state: axum::extract::State<AppState>,
    Path(view_name): Path<String>,
    Query(query): Query<RefreshQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let outcome = refresh::refresh_view(&state.db, &view_name, mode_for(&query)).await?;
    Ok(Json(outcome))
}

/// `POST /views/refresh-all` — operator-triggered refresh of every view.
pub async fn refresh_all_views(
    state: axum::extract::State<AppState>,
    Query(query): Query<RefreshQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let response = refresh::refresh_all(&state.db, mode_for(&query)).await;
    Ok(Json(response))
}
