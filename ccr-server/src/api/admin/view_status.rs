use axum::{Json, response::IntoResponse};
use ccr_core::maintenance::refresh;

use crate::state::AppState;

use super::AdminApiError;

/// `GET /views/status` — row counts, last refresh and staleness per view.
pub async fn view_status(
    state: axum::extract::State<AppState>,
) -> Result<impl IntoResponse, AdminApiError> {
    let response = refresh::view_status(&state.db).await?;
    Ok(Json(response))
}
