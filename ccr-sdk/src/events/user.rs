//! User events published by the auth service.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// What happened to the user account.
///
/// `Unknown` absorbs action tags introduced by newer producers; the handler
/// logs and skips them rather than dead-lettering the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserAction {
    Registered,
    LoggedIn,
    Updated,
    Deleted,
    Enabled,
    Disabled,
    #[serde(other)]
    Unknown,
}

impl UserAction {
    /// Tag stored in the activity fact table.
    pub fn as_str(self) -> &'static str {
        match self {
            UserAction::Registered => "REGISTERED",
            UserAction::LoggedIn => "LOGGED_IN",
            UserAction::Updated => "UPDATED",
            UserAction::Deleted => "DELETED",
            UserAction::Enabled => "ENABLED",
            UserAction::Disabled => "DISABLED",
            UserAction::Unknown => "UNKNOWN",
        }
    }
}

/// A user account event.
///
/// Profile fields are change-only: an `UPDATED` event carries just the
/// fields that changed, and absent fields must not overwrite stored values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEvent {
    pub event_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: CompactString,
    #[serde(default)]
    pub correlation_id: Option<String>,

    pub action: UserAction,
    /// Producer-side user id, numeric but transported as a string.
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<CompactString>,
    #[serde(default)]
    pub region: Option<CompactString>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_producer_payload() {
        let json = r#"{
            "eventId": "evt-user-7f3a",
            "timestamp": "2024-03-14T09:26:53Z",
            "source": "auth-service",
            "correlationId": "req-8812",
            "action": "REGISTERED",
            "userId": "42",
            "username": "linh.tran",
            "email": "linh.tran@example.com",
            "role": "EV_OWNER",
            "region": "SOUTH",
            "enabled": true
        }"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.action, UserAction::Registered);
        assert_eq!(event.user_id, "42");
        assert_eq!(event.role.as_deref(), Some("EV_OWNER"));
        assert!(event.organization_name.is_none());
    }

    #[test]
    fn unknown_action_tag_is_tolerated() {
        let json = r#"{
            "eventId": "evt-user-9c01",
            "timestamp": "2024-03-14T09:26:53Z",
            "source": "auth-service",
            "action": "PASSWORD_ROTATED",
            "userId": "42"
        }"#;
        let event: UserEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.action, UserAction::Unknown);
    }
}
