//! Event plumbing for the ingestion pipeline.
//!
//! # Flow
//!
//! 1. Producers (via the server's ingest surface) publish raw payloads to
//!    the per-category delivery queues through [`EventBus`].
//! 2. One `EventConsumer` per category deserializes, claims, and upserts.
//! 3. Side effects collected during handling are applied after commit:
//!    metric increments directly, notifications via the notification
//!    channel to the `NotificationWriter`.
//! 4. Failed messages travel over the dead-letter channel to the
//!    `DeadLetterWriter` and are never redelivered.

pub mod channels;
pub mod types;

pub use channels::{
    DEFAULT_CHANNEL_BUFFER, DeadLetterReceiver, DeadLetterSender, DeliveryReceiver,
    DeliverySender, EventBus, NotificationReceiver, NotificationSender, PublishError,
    dead_letter_channel, delivery_channel, notification_channel,
};

pub use types::{
    DeadLetter, Delivery, MetricEvent, NotificationCategory, NotificationRequest, SideEffect,
    SideEffects, Severity, error_kind,
};
