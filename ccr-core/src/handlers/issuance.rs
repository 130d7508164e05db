//! Handler for carbon credit issuance events.

use super::{HandlerError, parse_actor_id};
use crate::entities::IssuanceFact;
use crate::events::{
    MetricEvent, NotificationCategory, NotificationRequest, Severity, SideEffect, SideEffects,
};
use ccr_sdk::events::{IssuanceEvent, IssuanceStatus};

/// Upsert an issuance fact and compute its side effects.
///
/// PENDING and REJECTED events carry no issuance id (no credits exist
/// yet); the row is keyed by request id until an APPROVED event re-keys
/// the fact under the real issuance id.
pub async fn handle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &IssuanceEvent,
) -> Result<SideEffects, HandlerError> {
    let fact = IssuanceFact {
        issuance_id: fact_key(event).to_owned(),
        user_id: parse_actor_id("user_id", Some(&event.user_id)),
        vehicle_id: event.vehicle_id.clone(),
        quantity_tco2e: event.quantity_tco2e,
        distance_km: event.distance_km,
        energy_kwh: event.energy_kwh,
        co2_avoided_kg: event.co2_avoided_kg,
        issued_at: event.timestamp,
        region: event.region.as_ref().map(|r| r.to_string()),
        request_id: event.request_id.clone(),
        status: event.status.as_str().to_owned(),
    };
    fact.upsert_tx(tx).await?;

    let mut effects = SideEffects::new();
    if event.status == IssuanceStatus::Approved {
        effects.push(SideEffect::Metric(MetricEvent::CreditIssued));
    }
    effects.push(SideEffect::Notify(status_notification(event)));
    Ok(effects)
}

/// The stored row key: the issuance id once credits exist, else the
/// request id.
fn fact_key(event: &IssuanceEvent) -> &str {
    event.issuance_id.as_deref().unwrap_or(&event.request_id)
}

fn status_notification(event: &IssuanceEvent) -> NotificationRequest {
    let quantity = event.quantity_tco2e.round_dp(2);
    let (severity, title, message) = match event.status {
        IssuanceStatus::Pending => (
            Severity::Info,
            "Carbon Credit Request Submitted",
            format!("Your carbon credit request for {quantity} tCO2e is being reviewed"),
        ),
        IssuanceStatus::Approved => (
            Severity::Success,
            "Carbon Credits Issued",
            format!("{quantity} tCO2e carbon credits have been issued to your account"),
        ),
        IssuanceStatus::Rejected => (
            Severity::Warning,
            "Carbon Credit Request Rejected",
            format!("Your carbon credit request for {quantity} tCO2e has been rejected"),
        ),
    };
    NotificationRequest {
        severity,
        category: NotificationCategory::Business,
        title: title.to_owned(),
        message,
        source: event.source.clone(),
        recipient_user_id: parse_actor_id("user_id", Some(&event.user_id)),
        expires_in_hours: 168,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(status: &str, issuance_id: Option<&str>) -> IssuanceEvent {
        serde_json::from_value(serde_json::json!({
            "eventId": "evt-i1",
            "timestamp": "2024-03-15T08:00:00Z",
            "source": "carbon-service",
            "issuanceId": issuance_id,
            "requestId": "REQ-7",
            "userId": "42",
            "quantityTco2e": "3.25",
            "status": status
        }))
        .unwrap()
    }

    #[test]
    fn pending_is_keyed_by_request_id() {
        // A PENDING and a later APPROVED event for the same request land on
        // one logical fact: first keyed REQ-7, then re-keyed ISS-100 by the
        // approval upsert. The upsert overwrites unconditionally, so an
        // out-of-order arrival of the older PENDING after APPROVED would
        // regress the row's status; only the ledger claim (same event id)
        // protects against replays, not against reordering.
        assert_eq!(fact_key(&event("PENDING", None)), "REQ-7");
        assert_eq!(fact_key(&event("APPROVED", Some("ISS-100"))), "ISS-100");
    }

    #[test]
    fn notifications_match_the_outcome() {
        let pending = status_notification(&event("PENDING", None));
        assert_eq!(pending.severity, Severity::Info);
        assert_eq!(pending.recipient_user_id, Some(42));
        assert_eq!(pending.expires_in_hours, 168);

        let approved = status_notification(&event("APPROVED", Some("ISS-100")));
        assert_eq!(approved.severity, Severity::Success);
        assert!(approved.message.contains("3.25"));

        let rejected = status_notification(&event("REJECTED", None));
        assert_eq!(rejected.severity, Severity::Warning);
    }
}
