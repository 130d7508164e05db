//! Handler for marketplace trade events.

use super::{HandlerError, parse_actor_id};
use crate::entities::TradeFact;
use crate::events::{
    MetricEvent, NotificationCategory, NotificationRequest, Severity, SideEffect, SideEffects,
};
use ccr_sdk::events::{OrderStatus, TradeEvent};
use rust_decimal::Decimal;

/// Trades at or above this amount get a broadcast notification.
const HIGH_VALUE_THRESHOLD: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Upsert a trade fact and compute its side effects.
pub async fn handle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &TradeEvent,
) -> Result<SideEffects, HandlerError> {
    let fact = TradeFact {
        order_id: event.order_id,
        listing_id: event.listing_id,
        buyer_id: parse_actor_id("buyer_id", event.buyer_id.as_deref()),
        seller_id: parse_actor_id("seller_id", event.seller_id.as_deref()),
        quantity: event.quantity,
        unit: event
            .quantity_unit
            .as_deref()
            .unwrap_or("tCO2e")
            .to_owned(),
        unit_price: event.unit_price,
        amount: event.amount,
        currency: event.currency.to_string(),
        executed_at: event.timestamp,
        region: event.region.as_ref().map(|r| r.to_string()),
        is_auction: event.is_auction.unwrap_or(false),
        order_status: event.order_status.as_str().to_owned(),
        status_changed_at: event.status_changed_at.unwrap_or(event.timestamp),
    };
    fact.upsert_tx(tx).await?;

    let mut effects = SideEffects::new();
    if counts_as_executed(event.order_status) {
        effects.push(SideEffect::Metric(MetricEvent::TradeExecuted));
    }
    if is_high_value(event.amount) {
        effects.push(SideEffect::Notify(high_value_notification(event)));
    }
    Ok(effects)
}

/// Only trades that actually move toward settlement count in the executed
/// metric; order creation and cancellation do not.
fn counts_as_executed(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Completed | OrderStatus::PendingPayment)
}

fn is_high_value(amount: Decimal) -> bool {
    amount > HIGH_VALUE_THRESHOLD
}

fn high_value_notification(event: &TradeEvent) -> NotificationRequest {
    NotificationRequest {
        severity: Severity::Info,
        category: NotificationCategory::Business,
        title: "High-Value Trade Executed".to_owned(),
        message: format!("Trade of {} {} executed", event.amount, event.currency),
        source: event.source.clone(),
        recipient_user_id: None,
        expires_in_hours: 24,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_settling_statuses_count_as_executed() {
        assert!(counts_as_executed(OrderStatus::Completed));
        assert!(counts_as_executed(OrderStatus::PendingPayment));
        assert!(!counts_as_executed(OrderStatus::Created));
        assert!(!counts_as_executed(OrderStatus::Updated));
        assert!(!counts_as_executed(OrderStatus::Cancelled));
    }

    #[test]
    fn high_value_threshold_is_exclusive() {
        assert!(!is_high_value(Decimal::new(1_000_000, 0)));
        assert!(is_high_value(Decimal::new(1_000_001, 0)));
        assert!(!is_high_value(Decimal::new(999_999, 0)));
    }
}
