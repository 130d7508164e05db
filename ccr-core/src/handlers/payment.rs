//! Handler for payment events.

use super::{HandlerError, parse_actor_id};
use crate::entities::PaymentFact;
use crate::events::{
    MetricEvent, NotificationCategory, NotificationRequest, Severity, SideEffect, SideEffects,
};
use ccr_sdk::events::{PaymentEvent, PaymentStatus};
use time::OffsetDateTime;

/// Upsert a payment fact and compute its side effects.
pub async fn handle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &PaymentEvent,
) -> Result<SideEffects, HandlerError> {
    let fact = PaymentFact {
        payment_id: event.payment_id.clone(),
        order_id: event.order_id.clone(),
        payer_id: event.payer_id.clone(),
        payee_id: event.payee_id.clone(),
        amount: event.amount,
        currency: event.currency.to_string(),
        status: event.status.as_str().to_owned(),
        payment_method: event.payment_method.as_ref().map(|m| m.to_string()),
        completed_at: status_timestamp(event),
        region: event.region.as_ref().map(|r| r.to_string()),
        status_changed_at: event.timestamp,
    };
    fact.upsert_tx(tx).await?;

    let mut effects = SideEffects::new();
    match event.status {
        PaymentStatus::Completed => {
            effects.push(SideEffect::Metric(MetricEvent::PaymentCompleted));
        }
        PaymentStatus::Failed => {
            effects.push(SideEffect::Metric(MetricEvent::PaymentFailed));
            effects.push(SideEffect::Notify(failed_notification(event)));
        }
        PaymentStatus::Pending | PaymentStatus::Processing | PaymentStatus::Refunded => {}
    }
    Ok(effects)
}

/// The timestamp stored with the fact: completion wins over failure,
/// failure over initiation, with the event timestamp as the last resort
/// (the conflict key cannot be null).
fn status_timestamp(event: &PaymentEvent) -> OffsetDateTime {
    event
        .completed_at
        .or(event.failed_at)
        .or(event.initiated_at)
        .unwrap_or(event.timestamp)
}

fn failed_notification(event: &PaymentEvent) -> NotificationRequest {
    NotificationRequest {
        severity: Severity::Warning,
        category: NotificationCategory::Business,
        title: "Payment Failed".to_owned(),
        message: format!(
            "Payment {} failed: {}",
            event.payment_id,
            event.error_message.as_deref().unwrap_or("<no error detail>"),
        ),
        source: event.source.clone(),
        recipient_user_id: parse_actor_id("payer_id", event.payer_id.as_deref()),
        expires_in_hours: 48,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn event_with_timestamps(
        completed: Option<OffsetDateTime>,
        failed: Option<OffsetDateTime>,
        initiated: Option<OffsetDateTime>,
    ) -> PaymentEvent {
        let mut event: PaymentEvent = serde_json::from_value(serde_json::json!({
            "eventId": "evt-p1",
            "timestamp": "2024-03-14T12:00:00Z",
            "source": "payment-service",
            "paymentId": "PAY-1",
            "amount": "100",
            "currency": "VND",
            "status": "COMPLETED"
        }))
        .unwrap();
        event.completed_at = completed;
        event.failed_at = failed;
        event.initiated_at = initiated;
        event
    }

    #[test]
    fn completed_wins_over_failed_and_initiated() {
        let completed = datetime!(2024-03-14 12:03:00 UTC);
        let failed = datetime!(2024-03-14 12:02:00 UTC);
        let initiated = datetime!(2024-03-14 12:01:00 UTC);

        let event = event_with_timestamps(Some(completed), Some(failed), Some(initiated));
        assert_eq!(status_timestamp(&event), completed);

        let event = event_with_timestamps(None, Some(failed), Some(initiated));
        assert_eq!(status_timestamp(&event), failed);

        let event = event_with_timestamps(None, None, Some(initiated));
        assert_eq!(status_timestamp(&event), initiated);
    }

    #[test]
    fn event_timestamp_is_the_fallback() {
        let event = event_with_timestamps(None, None, None);
        assert_eq!(status_timestamp(&event), datetime!(2024-03-14 12:00:00 UTC));
    }

    #[test]
    fn failed_notification_targets_the_payer() {
        let mut event = event_with_timestamps(None, None, None);
        event.payer_id = Some("1001".to_owned());
        event.error_message = Some("card declined".to_owned());
        let note = failed_notification(&event);
        assert_eq!(note.recipient_user_id, Some(1001));
        assert!(note.message.contains("card declined"));
        assert_eq!(note.expires_in_hours, 48);
    }
}
