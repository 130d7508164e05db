//! Persisted system notifications.
//!
//! Handlers only describe notifications as side effects; the
//! `NotificationWriter` processor persists them here after the event's
//! storage transaction has committed.

use crate::events::NotificationRequest;
use time::{Duration, OffsetDateTime};

pub struct SystemNotification;

impl SystemNotification {
    /// Persist one notification. `expires_in_hours` is converted to an
    /// absolute expiry at write time.
    pub async fn insert(
        pool: &sqlx::PgPool,
        request: &NotificationRequest,
    ) -> Result<(), sqlx::Error> {
        let expires_at =
            OffsetDateTime::now_utc() + Duration::hours(request.expires_in_hours);
        sqlx::query(
            r#"
            INSERT INTO system_notifications
                (severity, category, title, message, source, recipient_user_id, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.severity.as_str())
        .bind(request.category.as_str())
        .bind(&request.title)
        .bind(&request.message)
        .bind(request.source.as_str())
        .bind(request.recipient_user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
