//! Consumer dispatch layer.
//!
//! One `EventConsumer` per category pulls deliveries off the category
//! queue and processes them through the state machine
//! `Received -> Deserialized -> Claimed|Duplicate -> Processed|Failed`.
//!
//! Duplicates and processed messages are acknowledged (dropped);
//! deserialization and handler failures route the raw payload to the
//! dead-letter channel and are never redelivered, since blind requeue
//! risks poison-message loops. Ordering across event ids is not
//! guaranteed; the store's last-write-wins upserts keep final state
//! eventually consistent for create/update pairs.

use crate::entities::{ConsumedEvent, DeadLetterEvent};
use crate::events::{
    DeadLetter, DeadLetterReceiver, DeadLetterSender, Delivery, DeliveryReceiver,
    NotificationSender, SideEffect, SideEffects, error_kind,
};
use crate::handlers::{self, HandlerError, InboundEvent};
use crate::metrics;
use ccr_sdk::events::EventCategory;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tracing::{debug, error, info, warn};

/// Upper bound on concurrently processed messages per category queue.
/// Two workers' worth of throughput is the idle baseline; bursts fan out
/// up to this cap.
pub const MAX_IN_FLIGHT: usize = 8;

/// Terminal state of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Claimed and folded into the store.
    Processed,
    /// Already claimed earlier; acknowledged without side effects.
    Duplicate,
    /// Rejected to the dead-letter path.
    DeadLettered,
}

/// Consumes one category queue with a bounded worker pool.
pub struct EventConsumer {
    category: EventCategory,
    pool: PgPool,
    notification_tx: NotificationSender,
    dead_letter_tx: DeadLetterSender,
}

impl EventConsumer {
    pub fn new(
        category: EventCategory,
        pool: PgPool,
        notification_tx: NotificationSender,
        dead_letter_tx: DeadLetterSender,
    ) -> Self {
        Self {
            category,
            pool,
            notification_tx,
            dead_letter_tx,
        }
    }

    /// Run until shutdown is signaled or the queue closes.
    pub async fn run(
        self,
        mut delivery_rx: DeliveryReceiver,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!(category = %self.category, queue = self.category.queue_name(), "EventConsumer started");

        let semaphore = Arc::new(Semaphore::new(MAX_IN_FLIGHT));

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!(category = %self.category, "EventConsumer received shutdown signal");
                        break;
                    }
                }

                maybe_delivery = delivery_rx.recv() => {
                    let Some(delivery) = maybe_delivery else {
                        info!(category = %self.category, "delivery queue closed");
                        break;
                    };

                    let Ok(permit) = semaphore.clone().acquire_owned().await else {
                        break;
                    };
                    let pool = self.pool.clone();
                    let category = self.category;
                    let notification_tx = self.notification_tx.clone();
                    let dead_letter_tx = self.dead_letter_tx.clone();
                    tokio::spawn(async move {
                        process_delivery(&pool, category, &notification_tx, &dead_letter_tx, delivery)
                            .await;
                        drop(permit);
                    });
                }
            }
        }

        // Wait for in-flight workers before reporting shutdown.
        let _ = semaphore.acquire_many(MAX_IN_FLIGHT as u32).await;
        info!(category = %self.category, "EventConsumer shutdown complete");
    }
}

/// Process one delivery to its terminal state.
async fn process_delivery(
    pool: &PgPool,
    category: EventCategory,
    notification_tx: &NotificationSender,
    dead_letter_tx: &DeadLetterSender,
    delivery: Delivery,
) -> DispatchOutcome {
    let event = match InboundEvent::parse(category, &delivery.body) {
        Ok(event) => event,
        Err(err) => {
            warn!(category = %category, error = %err, "failed to deserialize event payload");
            metrics::record_processing_error(category);
            metrics::record_dead_letter(category);
            send_dead_letter(
                dead_letter_tx,
                category,
                delivery,
                error_kind::DESERIALIZATION,
                err.to_string(),
            )
            .await;
            return DispatchOutcome::DeadLettered;
        }
    };

    match claim_and_apply(pool, &event, &delivery).await {
        Ok(Some(effects)) => {
            debug!(
                category = %category,
                event_id = event.event_id(),
                "event processed"
            );
            apply_side_effects(effects, notification_tx).await;
            metrics::record_event_processed(category);
            DispatchOutcome::Processed
        }
        Ok(None) => {
            // Expected under at-least-once delivery; ack silently.
            debug!(
                category = %category,
                event_id = event.event_id(),
                "event already processed, skipping"
            );
            metrics::record_duplicate(category);
            DispatchOutcome::Duplicate
        }
        Err(err) => {
            error!(
                category = %category,
                event_id = event.event_id(),
                error = %err,
                "failed to process event"
            );
            metrics::record_processing_error(category);
            metrics::record_dead_letter(category);
            send_dead_letter(
                dead_letter_tx,
                category,
                delivery,
                error_kind::HANDLER,
                err.to_string(),
            )
            .await;
            DispatchOutcome::DeadLettered
        }
    }
}

/// Claim the event id and run its handler in a single transaction.
///
/// Returns `None` for a duplicate. A crash after the claim commits but
/// before the handler's writes would leave the event marked-but-missing;
/// that window does not exist here because both happen in one transaction,
/// but the dead-letter path after a handler failure intentionally does not
/// roll back the ledger of previously committed events.
async fn claim_and_apply(
    pool: &PgPool,
    event: &InboundEvent,
    delivery: &Delivery,
) -> Result<Option<SideEffects>, HandlerError> {
    let payload: serde_json::Value =
        serde_json::from_str(&delivery.body).unwrap_or(serde_json::Value::Null);

    let mut tx = pool.begin().await?;
    let claimed = ConsumedEvent::claim_tx(
        &mut tx,
        event.event_id(),
        event.category().ledger_tag(),
        &payload,
    )
    .await?;
    if !claimed {
        tx.rollback().await?;
        return Ok(None);
    }

    let effects = handlers::dispatch(&mut tx, event).await?;
    tx.commit().await?;
    Ok(Some(effects))
}

/// Apply side effects after the storage transaction has committed. A
/// failure here is logged and dropped; it can never undo the upsert.
async fn apply_side_effects(effects: SideEffects, notification_tx: &NotificationSender) {
    for effect in effects {
        match effect {
            SideEffect::Metric(event) => metrics::record_metric_event(event),
            SideEffect::Notify(request) => {
                if let Err(err) = notification_tx.send(request).await {
                    warn!(error = %err, "notification channel closed, dropping notification");
                }
            }
        }
    }
}

async fn send_dead_letter(
    dead_letter_tx: &DeadLetterSender,
    category: EventCategory,
    delivery: Delivery,
    kind: &'static str,
    message: String,
) {
    let letter = DeadLetter {
        category,
        payload: delivery.body,
        error_kind: kind,
        error_message: message,
        received_at: delivery.received_at,
    };
    if let Err(err) = dead_letter_tx.send(letter).await {
        error!(error = %err, "dead-letter channel closed, dropping message");
    }
}

/// Persists dead letters for manual inspection.
pub struct DeadLetterWriter {
    pool: PgPool,
}

impl DeadLetterWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run(self, mut rx: DeadLetterReceiver, mut shutdown_rx: watch::Receiver<bool>) {
        info!("DeadLetterWriter started");
        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("DeadLetterWriter received shutdown signal");
                        break;
                    }
                }

                maybe_letter = rx.recv() => {
                    let Some(letter) = maybe_letter else {
                        info!("dead-letter channel closed");
                        break;
                    };
                    if let Err(err) = DeadLetterEvent::insert(&self.pool, &letter).await {
                        error!(
                            category = %letter.category,
                            error = %err,
                            "failed to persist dead letter"
                        );
                    }
                }
            }
        }
        info!("DeadLetterWriter shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{
        MetricEvent, NotificationCategory, NotificationRequest, Severity, dead_letter_channel,
        notification_channel,
    };
    use smallvec::smallvec;

    #[tokio::test]
    async fn side_effects_flow_to_the_notification_channel() {
        let (tx, mut rx) = notification_channel();
        let effects: SideEffects = smallvec![
            SideEffect::Metric(MetricEvent::TradeExecuted),
            SideEffect::Notify(NotificationRequest {
                severity: Severity::Info,
                category: NotificationCategory::Business,
                title: "t".into(),
                message: "m".into(),
                source: "test".into(),
                recipient_user_id: None,
                expires_in_hours: 1,
            }),
        ];

        apply_side_effects(effects, &tx).await;

        let note = rx.recv().await.unwrap();
        assert_eq!(note.title, "t");
    }

    #[tokio::test]
    async fn rejected_payload_reaches_the_dead_letter_channel() {
        let (tx, mut rx) = dead_letter_channel();
        let delivery = Delivery::new("not json".into());
        let received_at = delivery.received_at;

        send_dead_letter(
            &tx,
            EventCategory::Payment,
            delivery,
            error_kind::DESERIALIZATION,
            "expected value".into(),
        )
        .await;

        let letter = rx.recv().await.unwrap();
        assert_eq!(letter.category, EventCategory::Payment);
        assert_eq!(letter.error_kind, "DESERIALIZATION");
        assert_eq!(letter.payload, "not json");
        assert_eq!(letter.received_at, received_at);
    }
}
