use axum::{Json, extract::Path, response::IntoResponse};
use ccr_core::entities::PartitionMetadata;
use ccr_core::entities::partition_meta::GetPartitionInfo;
use ccr_sdk::admin::PartitionInfoResponse;
use kanau::processor::Processor;

use crate::state::AppState;

use super::AdminApiError;

/// `GET /partitions/{table_name}` — list a managed table's partitions.
pub async fn partition_info(
    state: axum::extract::State<AppState>,
    Path(table_name): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    // Only tables under partition management are visible here.
    let meta = PartitionMetadata::get(&state.db, &table_name)
        .await
        .map_err(AdminApiError::Database)?;
    if meta.is_none() {
        return Err(AdminApiError::UnknownTable(table_name));
    }

    let partitions = state
        .db_processor()
        .process(GetPartitionInfo {
            table_name: table_name.clone(),
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(PartitionInfoResponse {
        table_name,
        partitions,
    }))
}
