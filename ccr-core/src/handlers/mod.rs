//! Per-category event handlers.
//!
//! Each handler folds one inbound event into the reporting store inside
//! the caller's transaction and returns the side effects to apply after
//! commit. Handlers are only invoked after a successful ledger claim, so
//! they never see the same event id twice under correct operation.

pub mod issuance;
pub mod payment;
pub mod trade;
pub mod user;

use crate::events::SideEffects;
use ccr_sdk::events::{EventCategory, IssuanceEvent, PaymentEvent, TradeEvent, UserEvent};

/// Errors surfaced by a handler. Anything here dead-letters the message.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid {field}: {value:?}")]
    InvalidField {
        field: &'static str,
        value: String,
    },

    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A deserialized inbound event, tagged by category.
///
/// The set is closed: adding a category means adding a variant here, a
/// queue, and an arm in [`dispatch`], all checked at compile time.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    User(UserEvent),
    Trade(TradeEvent),
    Payment(PaymentEvent),
    Issuance(IssuanceEvent),
}

impl InboundEvent {
    /// Deserialize a raw payload for the given category.
    pub fn parse(category: EventCategory, body: &str) -> Result<Self, serde_json::Error> {
        Ok(match category {
            EventCategory::User => InboundEvent::User(serde_json::from_str(body)?),
            EventCategory::Trade => InboundEvent::Trade(serde_json::from_str(body)?),
            EventCategory::Payment => InboundEvent::Payment(serde_json::from_str(body)?),
            EventCategory::Issuance => InboundEvent::Issuance(serde_json::from_str(body)?),
        })
    }

    /// The producer-assigned event id used for the ledger claim.
    pub fn event_id(&self) -> &str {
        match self {
            InboundEvent::User(e) => &e.event_id,
            InboundEvent::Trade(e) => &e.event_id,
            InboundEvent::Payment(e) => &e.event_id,
            InboundEvent::Issuance(e) => &e.event_id,
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            InboundEvent::User(_) => EventCategory::User,
            InboundEvent::Trade(_) => EventCategory::Trade,
            InboundEvent::Payment(_) => EventCategory::Payment,
            InboundEvent::Issuance(_) => EventCategory::Issuance,
        }
    }
}

/// Route an event to its category handler.
pub async fn dispatch(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &InboundEvent,
) -> Result<SideEffects, HandlerError> {
    match event {
        InboundEvent::User(e) => user::handle(tx, e).await,
        InboundEvent::Trade(e) => trade::handle(tx, e).await,
        InboundEvent::Payment(e) => payment::handle(tx, e).await,
        InboundEvent::Issuance(e) => issuance::handle(tx, e).await,
    }
}

/// Leniently parse a producer-side numeric id transported as a string.
///
/// Bad formats are logged and treated as absent, matching the upstream
/// services' own tolerance for legacy id shapes.
pub(crate) fn parse_actor_id(field: &'static str, value: Option<&str>) -> Option<i64> {
    let raw = value?;
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::warn!(field, value = raw, "invalid numeric id in event payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_routes_by_category() {
        let body = r#"{
            "eventId": "evt-1",
            "timestamp": "2024-03-14T09:00:00Z",
            "source": "auth-service",
            "action": "LOGGED_IN",
            "userId": "7"
        }"#;
        let event = InboundEvent::parse(EventCategory::User, body).unwrap();
        assert!(matches!(event, InboundEvent::User(_)));
        assert_eq!(event.event_id(), "evt-1");
        assert_eq!(event.category(), EventCategory::User);
    }

    #[test]
    fn parse_rejects_malformed_payload() {
        let result = InboundEvent::parse(EventCategory::Trade, "{\"eventId\": 3}");
        assert!(result.is_err());
    }

    #[test]
    fn actor_id_parsing_is_lenient() {
        assert_eq!(parse_actor_id("buyer_id", Some("1001")), Some(1001));
        assert_eq!(parse_actor_id("buyer_id", Some("not-a-number")), None);
        assert_eq!(parse_actor_id("buyer_id", Some("")), None);
        assert_eq!(parse_actor_id("buyer_id", None), None);
    }
}
