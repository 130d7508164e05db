//! Operator API handlers.
//!
//! Consumed by the admin/query layer. Authentication is terminated by
//! that layer; these endpoints expose the core's maintenance contract.
//!
//! # Endpoints
//!
//! - `POST /views/{view_name}/refresh`      – refresh one materialized view
//! - `POST /views/refresh-all`              – refresh every registered view
//! - `GET  /views/status`                   – freshness/staleness snapshot
//! - `GET  /views/refresh-history`          – bounded refresh history
//! - `GET  /partitions/{table_name}`        – list a table's partitions
//! - `POST /partitions/{table_name}/create` – manually create one partition

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::state::AppState;
use ccr_core::maintenance::{PartitionError, RefreshError};

mod create_partition;
mod partition_info;
mod refresh_history;
mod refresh_view;
mod view_status;

/// Build the operator API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/views/refresh-all", post(refresh_view::refresh_all_views))
        .route("/views/{view_name}/refresh", post(refresh_view::refresh_one_view))
        .route("/views/status", get(view_status::view_status))
        .route("/views/refresh-history", get(refresh_history::refresh_history))
        .route("/partitions/{table_name}", get(partition_info::partition_info))
        .route(
            "/partitions/{table_name}/create",
            post(create_partition::create_partition),
        )
}

/// Errors that can occur in operator API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Database(sqlx::Error),
    UnknownView(String),
    UnknownTable(String),
    InvalidRequest(String),
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "operator API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::UnknownView(name) => {
                (StatusCode::NOT_FOUND, format!("unknown materialized view: {name}"))
                    .into_response()
            }
            AdminApiError::UnknownTable(name) => {
                (StatusCode::NOT_FOUND, format!("unknown partitioned table: {name}"))
                    .into_response()
            }
            AdminApiError::InvalidRequest(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
        }
    }
}

impl From<RefreshError> for AdminApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::UnknownView(name) => AdminApiError::UnknownView(name),
            RefreshError::Database(e) => AdminApiError::Database(e),
        }
    }
}

impl From<PartitionError> for AdminApiError {
    fn from(err: PartitionError) -> Self {
        match err {
            PartitionError::UnknownTable(name) => AdminApiError::UnknownTable(name),
            PartitionError::InvalidMonth { year, month } => {
                AdminApiError::InvalidRequest(format!("invalid partition month: {year}-{month}"))
            }
            PartitionError::Database(e) => AdminApiError::Database(e),
        }
    }
}
