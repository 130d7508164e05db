//! Payment events published by the payment service.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

/// A payment status change.
///
/// Carries up to three status timestamps; the reporting store keeps the
/// most significant one (completed, else failed, else initiated).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: CompactString,
    #[serde(default)]
    pub correlation_id: Option<String>,

    pub payment_id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub payee_id: Option<String>,
    pub amount: Decimal,
    pub currency: CompactString,
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<CompactString>,
    #[serde(default)]
    pub region: Option<CompactString>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub initiated_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub failed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub error_code: Option<CompactString>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_failed_payment() {
        let json = r#"{
            "eventId": "evt-pay-3f90",
            "timestamp": "2024-03-14T11:40:00Z",
            "source": "payment-service",
            "paymentId": "PAY-2024-000311",
            "orderId": "ORD-88321",
            "payerId": "1001",
            "amount": "250000",
            "currency": "VND",
            "status": "FAILED",
            "paymentMethod": "VNPAY",
            "initiatedAt": "2024-03-14T11:39:12Z",
            "failedAt": "2024-03-14T11:40:00Z",
            "errorCode": "INSUFFICIENT_FUNDS",
            "errorMessage": "card balance too low"
        }"#;
        let event: PaymentEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, PaymentStatus::Failed);
        assert!(event.completed_at.is_none());
        assert!(event.failed_at.is_some());
        assert_eq!(event.error_code.as_deref(), Some("INSUFFICIENT_FUNDS"));
    }
}
