//! Queue and channel plumbing for the ingestion pipeline.
//!
//! Each event category has its own bounded delivery queue; side-effect
//! descriptors and dead letters travel over their own channels so the
//! writers can never block a consumer's storage transaction.

use super::types::{DeadLetter, Delivery, NotificationRequest};
use ccr_sdk::events::EventCategory;
use tokio::sync::mpsc;

/// Buffer size for the per-category delivery queues.
///
/// Large enough to absorb bursts while keeping memory bounded; a full
/// queue pushes back on the submitting layer.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

pub type DeliverySender = mpsc::Sender<Delivery>;
pub type DeliveryReceiver = mpsc::Receiver<Delivery>;

pub type NotificationSender = mpsc::Sender<NotificationRequest>;
pub type NotificationReceiver = mpsc::Receiver<NotificationRequest>;

pub type DeadLetterSender = mpsc::Sender<DeadLetter>;
pub type DeadLetterReceiver = mpsc::Receiver<DeadLetter>;

/// Create a delivery queue for one event category.
pub fn delivery_channel() -> (DeliverySender, DeliveryReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the notification side-effect channel.
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create the dead-letter channel.
pub fn dead_letter_channel() -> (DeadLetterSender, DeadLetterReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Error returned when a delivery cannot be queued.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The category queue is full; the caller should retry or shed load.
    #[error("queue for {0} is full")]
    QueueFull(EventCategory),
    /// The consumer side has shut down.
    #[error("queue for {0} is closed")]
    QueueClosed(EventCategory),
}

/// Publish handles for all category queues.
///
/// This is the "submit event" contract: anything holding an `EventBus`
/// can enqueue a raw payload for exactly one category.
#[derive(Clone)]
pub struct EventBus {
    user: DeliverySender,
    trade: DeliverySender,
    payment: DeliverySender,
    issuance: DeliverySender,
}

impl EventBus {
    pub fn new(
        user: DeliverySender,
        trade: DeliverySender,
        payment: DeliverySender,
        issuance: DeliverySender,
    ) -> Self {
        Self {
            user,
            trade,
            payment,
            issuance,
        }
    }

    fn sender_for(&self, category: EventCategory) -> &DeliverySender {
        match category {
            EventCategory::User => &self.user,
            EventCategory::Trade => &self.trade,
            EventCategory::Payment => &self.payment,
            EventCategory::Issuance => &self.issuance,
        }
    }

    /// Enqueue a raw payload without waiting. Fails fast when the queue is
    /// full so the submitting layer can report back pressure.
    pub fn try_publish(
        &self,
        category: EventCategory,
        delivery: Delivery,
    ) -> Result<(), PublishError> {
        self.sender_for(category)
            .try_send(delivery)
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => PublishError::QueueFull(category),
                mpsc::error::TrySendError::Closed(_) => PublishError::QueueClosed(category),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publishes_to_the_matching_queue() {
        let (user_tx, mut user_rx) = delivery_channel();
        let (trade_tx, mut trade_rx) = delivery_channel();
        let (payment_tx, _payment_rx) = delivery_channel();
        let (issuance_tx, _issuance_rx) = delivery_channel();
        let bus = EventBus::new(user_tx, trade_tx, payment_tx, issuance_tx);

        bus.try_publish(EventCategory::Trade, Delivery::new("{\"a\":1}".into()))
            .unwrap();

        let got = trade_rx.recv().await.unwrap();
        assert_eq!(got.body, "{\"a\":1}");
        assert!(user_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_reports_back_pressure() {
        let (user_tx, _user_rx) = mpsc::channel(1);
        let (trade_tx, _trade_rx) = delivery_channel();
        let (payment_tx, _payment_rx) = delivery_channel();
        let (issuance_tx, _issuance_rx) = delivery_channel();
        let bus = EventBus::new(user_tx, trade_tx, payment_tx, issuance_tx);

        bus.try_publish(EventCategory::User, Delivery::new("{}".into()))
            .unwrap();
        let err = bus
            .try_publish(EventCategory::User, Delivery::new("{}".into()))
            .unwrap_err();
        assert!(matches!(err, PublishError::QueueFull(EventCategory::User)));
    }
}
