//! Inbound business event shapes.
//!
//! Every upstream service publishes JSON with camelCase field names and a
//! shared envelope: a producer-assigned globally unique `eventId`, the
//! occurrence `timestamp`, the publishing `source` service, and an optional
//! `correlationId`. Redelivery of the same logical occurrence carries the
//! same `eventId`; the reporting core relies on that for idempotency.

pub mod issuance;
pub mod payment;
pub mod trade;
pub mod user;

pub use issuance::{IssuanceEvent, IssuanceStatus};
pub use payment::{PaymentEvent, PaymentStatus};
pub use trade::{OrderStatus, TradeEvent};
pub use user::{UserAction, UserEvent};

/// The closed set of event categories the reporting core consumes.
///
/// Each category has its own queue and its own handler; dispatch is an
/// exhaustive match, so adding a category is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    User,
    Trade,
    Payment,
    Issuance,
}

impl EventCategory {
    /// All categories, in dispatch order.
    pub const ALL: [EventCategory; 4] = [
        EventCategory::User,
        EventCategory::Trade,
        EventCategory::Payment,
        EventCategory::Issuance,
    ];

    /// The ledger `event_type` tag recorded for events of this category.
    pub fn ledger_tag(self) -> &'static str {
        match self {
            EventCategory::User => "USER_EVENT",
            EventCategory::Trade => "TRADE_EVENT",
            EventCategory::Payment => "PAYMENT_EVENT",
            EventCategory::Issuance => "ISSUANCE_EVENT",
        }
    }

    /// Lowercase name, used for routing and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::User => "user",
            EventCategory::Trade => "trade",
            EventCategory::Payment => "payment",
            EventCategory::Issuance => "issuance",
        }
    }

    /// The queue name this category is consumed from.
    pub fn queue_name(self) -> &'static str {
        match self {
            EventCategory::User => "reporting.user.events",
            EventCategory::Trade => "reporting.trade.events",
            EventCategory::Payment => "reporting.payment.events",
            EventCategory::Issuance => "reporting.issuance.events",
        }
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, thiserror::Error)]
#[error("unknown event category: {0}")]
pub struct UnknownCategory(pub String);

impl std::str::FromStr for EventCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(EventCategory::User),
            "trade" => Ok(EventCategory::Trade),
            "payment" => Ok(EventCategory::Payment),
            "issuance" => Ok(EventCategory::Issuance),
            other => Err(UnknownCategory(other.to_owned())),
        }
    }
}
