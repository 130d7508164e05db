//! Internal event and side-effect types.
//!
//! Inbound deliveries carry raw payload bytes; everything downstream of a
//! committed upsert travels as a descriptor so that a side-effect failure
//! can never roll back the store.

use ccr_sdk::events::EventCategory;
use compact_str::CompactString;
use smallvec::SmallVec;
use time::OffsetDateTime;

/// A message pulled off a category queue, not yet deserialized.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Raw JSON payload as published by the producer.
    pub body: String,
    pub received_at: OffsetDateTime,
}

impl Delivery {
    pub fn new(body: String) -> Self {
        Self {
            body,
            received_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Side effects a handler wants applied after its transaction commits.
pub type SideEffects = SmallVec<[SideEffect; 4]>;

#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Increment a business metric counter.
    Metric(MetricEvent),
    /// Persist a notification for the admin/user-facing layer.
    Notify(NotificationRequest),
}

/// Business metric counters incremented from the dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEvent {
    UserRegistered,
    UserLogin,
    TradeExecuted,
    CreditIssued,
    PaymentCompleted,
    PaymentFailed,
}

/// Severity of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
        }
    }
}

/// Category of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Business,
    System,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::Business => "BUSINESS",
            NotificationCategory::System => "SYSTEM",
        }
    }
}

/// A notification to persist. `recipient_user_id = None` broadcasts to
/// the admin audience.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub severity: Severity,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub source: CompactString,
    pub recipient_user_id: Option<i64>,
    pub expires_in_hours: i64,
}

/// A message that failed processing, on its way to the dead-letter table.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub category: EventCategory,
    pub payload: String,
    /// Which stage rejected the message.
    pub error_kind: &'static str,
    pub error_message: String,
    pub received_at: OffsetDateTime,
}

/// Stage tags recorded with dead letters.
pub mod error_kind {
    pub const DESERIALIZATION: &str = "DESERIALIZATION";
    pub const HANDLER: &str = "HANDLER";
}
