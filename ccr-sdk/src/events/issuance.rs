//! Carbon credit issuance events published by the carbon module.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Outcome of a credit issuance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuanceStatus {
    Pending,
    Approved,
    Rejected,
}

impl IssuanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IssuanceStatus::Pending => "PENDING",
            IssuanceStatus::Approved => "APPROVED",
            IssuanceStatus::Rejected => "REJECTED",
        }
    }
}

/// A carbon credit issuance event.
///
/// `issuance_id` only exists once credits have actually been issued, so it
/// is absent for PENDING and REJECTED outcomes; `request_id` is always
/// present and identifies the underlying request across its lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceEvent {
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: CompactString,
    #[serde(default)]
    pub correlation_id: Option<String>,

    #[serde(default)]
    pub issuance_id: Option<String>,
    pub request_id: String,
    /// Producer-side user id, numeric but transported as a string.
    pub user_id: String,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    pub quantity_tco2e: Decimal,
    #[serde(default)]
    pub distance_km: Option<Decimal>,
    #[serde(default)]
    pub energy_kwh: Option<Decimal>,
    #[serde(default)]
    pub co2_avoided_kg: Option<Decimal>,
    pub status: IssuanceStatus,
    #[serde(default)]
    pub region: Option<CompactString>,
    #[serde(default)]
    pub vehicle_make: Option<CompactString>,
    #[serde(default)]
    pub vehicle_model: Option<CompactString>,
    #[serde(default)]
    pub vehicle_type: Option<CompactString>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_request_has_no_issuance_id() {
        let json = r#"{
            "eventId": "evt-iss-5a17",
            "timestamp": "2024-03-15T08:00:00Z",
            "source": "carbon-service",
            "requestId": "REQ-2024-0777",
            "userId": "42",
            "vehicleId": "VF8-A10233",
            "quantityTco2e": "3.25",
            "distanceKm": "18250.4",
            "energyKwh": "3310.0",
            "status": "PENDING",
            "region": "CENTRAL"
        }"#;
        let event: IssuanceEvent = serde_json::from_str(json).unwrap();
        assert!(event.issuance_id.is_none());
        assert_eq!(event.status, IssuanceStatus::Pending);
        assert_eq!(event.request_id, "REQ-2024-0777");
    }
}
