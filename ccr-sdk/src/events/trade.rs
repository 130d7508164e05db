//! Trade/order events published by the marketplace service.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle status of a marketplace order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Updated,
    PendingPayment,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Updated => "UPDATED",
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A trade execution or order status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEvent {
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: CompactString,
    #[serde(default)]
    pub correlation_id: Option<String>,

    pub order_id: Uuid,
    #[serde(default)]
    pub listing_id: Option<Uuid>,
    /// Producer-side ids, numeric but transported as strings.
    #[serde(default)]
    pub buyer_id: Option<String>,
    #[serde(default)]
    pub seller_id: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub quantity_unit: Option<CompactString>,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub currency: CompactString,
    pub order_status: OrderStatus,
    #[serde(default)]
    pub region: Option<CompactString>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub status_changed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_auction: Option<bool>,
    #[serde(default)]
    pub auction_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_producer_payload() {
        let json = r#"{
            "eventId": "evt-trade-11b2",
            "timestamp": "2024-03-14T10:02:11+07:00",
            "source": "marketplace-service",
            "orderId": "7d444840-9dc0-11d1-b245-5ffdce74fad2",
            "listingId": "9b2b5c1e-0d4f-4e4b-8f3a-1c2d3e4f5a6b",
            "buyerId": "1001",
            "sellerId": "2002",
            "quantity": "12.5",
            "quantityUnit": "tCO2e",
            "unitPrice": "85000",
            "amount": "1062500",
            "currency": "VND",
            "orderStatus": "COMPLETED",
            "region": "NORTH",
            "isAuction": false
        }"#;
        let event: TradeEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.order_status, OrderStatus::Completed);
        assert_eq!(event.amount, Decimal::new(1_062_500, 0));
        assert_eq!(event.buyer_id.as_deref(), Some("1001"));
        assert!(event.status_changed_at.is_none());
    }
}
