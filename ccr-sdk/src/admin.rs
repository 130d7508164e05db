//! Operator-surface request/response objects.
//!
//! These are the shapes the admin/query layer exchanges with the reporting
//! core: view refresh commands, refresh history, and partition management.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Result of refreshing a single materialized view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub view_name: String,
    pub status: RefreshStatus,
    pub duration_ms: i64,
    /// Row count of the view after a successful refresh.
    pub rows_affected: Option<i64>,
    pub error_message: Option<String>,
}

/// Status of one refresh attempt, as recorded in the refresh log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshStatus {
    Running,
    Success,
    Failed,
}

impl RefreshStatus {
    /// Tag stored in the `mv_refresh_log.status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshStatus::Running => "RUNNING",
            RefreshStatus::Success => "SUCCESS",
            RefreshStatus::Failed => "FAILED",
        }
    }

    /// Parse a stored status tag; unknown tags read as `Failed`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "RUNNING" => RefreshStatus::Running,
            "SUCCESS" => RefreshStatus::Success,
            _ => RefreshStatus::Failed,
        }
    }
}

/// Response for the refresh-all operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshAllResponse {
    pub outcomes: Vec<RefreshOutcome>,
    pub duration_ms: i64,
}

/// Freshness snapshot of one materialized view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewStatus {
    pub view_name: String,
    pub row_count: i64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_refresh: Option<OffsetDateTime>,
    pub hours_since_refresh: Option<i64>,
    /// True when the last successful refresh is older than the staleness
    /// threshold (or has never happened).
    pub is_stale: bool,
}

/// Response for the view status listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewStatusResponse {
    pub views: Vec<ViewStatus>,
    #[serde(with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
}

/// One row of refresh history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshHistoryEntry {
    pub view_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub status: RefreshStatus,
    pub rows_affected: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub error_message: Option<String>,
}

/// One physical partition of a managed fact table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub partition_name: String,
    pub size: String,
}

/// Response for the partition listing of one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionInfoResponse {
    pub table_name: String,
    pub partitions: Vec<PartitionInfo>,
}

/// Request to manually create one monthly partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartitionRequest {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u8,
}

/// Response after manual partition creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartitionResponse {
    pub table_name: String,
    pub partition_name: String,
}

/// Response after submitting an event to the ingest queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitEventResponse {
    pub category: String,
    pub queued: bool,
}
