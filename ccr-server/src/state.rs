//! Application state shared across all request handlers.

use ccr_core::events::EventBus;
use ccr_core::framework::DatabaseProcessor;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around (pool and channel handles are
/// internally reference-counted).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Publish handles for the per-category event queues.
    pub bus: EventBus,
    /// Renders the Prometheus exposition text for `/metrics`.
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(db: PgPool, bus: EventBus, metrics: PrometheusHandle) -> Self {
        Self { db, bus, metrics }
    }

    /// A processor for the operator-surface queries.
    pub fn db_processor(&self) -> DatabaseProcessor {
        DatabaseProcessor::new(self.db.clone())
    }
}
