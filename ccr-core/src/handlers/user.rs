//! Handler for user account events.

use super::HandlerError;
use crate::entities::{ActivityFact, UserDim, UserProfilePatch};
use crate::events::{
    MetricEvent, NotificationCategory, NotificationRequest, Severity, SideEffect, SideEffects,
};
use ccr_sdk::events::{UserAction, UserEvent};

/// Apply one user event to the dimension and activity tables.
///
/// Every known action also appends an immutable activity fact so the
/// activity aggregates see registrations, logins and profile changes
/// alike. Unknown action tags are logged and skipped.
pub async fn handle(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event: &UserEvent,
) -> Result<SideEffects, HandlerError> {
    let mut effects = SideEffects::new();

    let user_id = event
        .user_id
        .parse::<i64>()
        .map_err(|_| HandlerError::InvalidField {
            field: "user_id",
            value: event.user_id.clone(),
        })?;

    let patch = profile_patch(event);

    match event.action {
        UserAction::Registered => {
            UserDim::upsert_registered_tx(
                tx,
                user_id,
                &patch,
                event.enabled.unwrap_or(true),
                event.timestamp,
            )
            .await?;
            effects.push(SideEffect::Metric(MetricEvent::UserRegistered));
            effects.push(SideEffect::Notify(registered_notification(event)));
        }
        UserAction::LoggedIn => {
            UserDim::touch_login_tx(tx, user_id, event.timestamp).await?;
            effects.push(SideEffect::Metric(MetricEvent::UserLogin));
        }
        UserAction::Updated => {
            UserDim::apply_patch_tx(tx, user_id, &patch, event.timestamp).await?;
        }
        UserAction::Deleted => {
            // Soft delete: the row stays for reporting history.
            UserDim::set_enabled_tx(tx, user_id, false, event.timestamp).await?;
        }
        UserAction::Enabled | UserAction::Disabled => {
            let enabled = event
                .enabled
                .unwrap_or(event.action == UserAction::Enabled);
            UserDim::set_enabled_tx(tx, user_id, enabled, event.timestamp).await?;
        }
        UserAction::Unknown => {
            tracing::warn!(
                event_id = %event.event_id,
                user_id,
                "unknown user action tag, skipping"
            );
            return Ok(effects);
        }
    }

    let event_data = serde_json::to_value(event)?;
    ActivityFact::insert_tx(tx, user_id, event.action.as_str(), &event_data, event.timestamp)
        .await?;

    Ok(effects)
}

fn profile_patch(event: &UserEvent) -> UserProfilePatch {
    UserProfilePatch {
        username: event.username.clone(),
        email: event.email.clone(),
        role: event.role.as_ref().map(|r| r.to_string()),
        region: event.region.as_ref().map(|r| r.to_string()),
        organization_name: event.organization_name.clone(),
        phone_number: event.phone_number.clone(),
    }
}

fn registered_notification(event: &UserEvent) -> NotificationRequest {
    NotificationRequest {
        severity: Severity::Info,
        category: NotificationCategory::Business,
        title: "New User Registered".to_owned(),
        message: format!(
            "User {} registered with role {}",
            event.username.as_deref().unwrap_or("<unknown>"),
            event.role.as_deref().unwrap_or("<unset>"),
        ),
        source: event.source.clone(),
        // Broadcast to admins.
        recipient_user_id: None,
        expires_in_hours: 72,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_event(action: UserAction) -> UserEvent {
        serde_json::from_value(serde_json::json!({
            "eventId": "evt-u1",
            "timestamp": "2024-03-14T09:00:00Z",
            "source": "auth-service",
            "action": action.as_str(),
            "userId": "42",
            "email": "new@example.com"
        }))
        .unwrap()
    }

    #[test]
    fn update_patch_leaves_absent_fields_untouched() {
        // An UPDATED event carrying only an email must not clear the other
        // profile columns; those go through COALESCE on the SQL side.
        let patch = profile_patch(&base_event(UserAction::Updated));
        assert_eq!(patch.email.as_deref(), Some("new@example.com"));
        assert!(patch.role.is_none());
        assert!(patch.region.is_none());
        assert!(patch.username.is_none());
    }

    #[test]
    fn registered_notification_broadcasts_to_admins() {
        let note = registered_notification(&base_event(UserAction::Registered));
        assert!(note.recipient_user_id.is_none());
        assert_eq!(note.expires_in_hours, 72);
    }
}
