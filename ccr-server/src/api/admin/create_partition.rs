use axum::{Json, extract::Path, response::IntoResponse};
use ccr_core::maintenance::partitions;
use ccr_sdk::admin::{CreatePartitionRequest, CreatePartitionResponse};

use crate::state::AppState;

use super::AdminApiError;

/// `POST /partitions/{table_name}/create` — manually create one monthly
/// partition, e.g. for a backfill beyond the create-ahead window.
pub async fn create_partition(
    state: axum::extract::State<AppState>,
    Path(table_name): Path<String>,
    Json(request): Json<CreatePartitionRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let partition_name = partitions::create_partition_manually(
        &state.db,
        &table_name,
        request.year,
        request.month,
    )
    .await?;

    Ok(Json(CreatePartitionResponse {
        table_name,
        partition_name,
    }))
}
