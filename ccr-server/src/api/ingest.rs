//! Event submission surface.
//!
//! `POST /api/events/{category}` is the "submit event" contract: the raw
//! JSON body is queued for the category's consumer. The body is not
//! validated here; deserialization, claiming and dead-lettering all
//! happen in the dispatch layer. Submission is fire-and-forget; a
//! processing failure is never reported back to the producer.

use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use ccr_core::events::{Delivery, PublishError};
use ccr_sdk::admin::SubmitEventResponse;
use ccr_sdk::events::EventCategory;

/// Build the ingest router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{category}", post(submit_event))
}

/// `POST /{category}` — queue one raw event payload.
async fn submit_event(
    State(state): State<AppState>,
    Path(category): Path<String>,
    body: String,
) -> impl IntoResponse {
    let Ok(category) = category.parse::<EventCategory>() else {
        return (
            StatusCode::BAD_REQUEST,
            format!("unknown event category: {category}"),
        )
            .into_response();
    };

    match state.bus.try_publish(category, Delivery::new(body)) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(SubmitEventResponse {
                category: category.to_string(),
                queued: true,
            }),
        )
            .into_response(),
        Err(err @ PublishError::QueueFull(_)) => {
            tracing::warn!(category = %category, "event queue full, rejecting submission");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
        Err(err @ PublishError::QueueClosed(_)) => {
            tracing::error!(category = %category, "event queue closed");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
    }
}
