//! Idempotency ledger.
//!
//! Each external event id is admitted exactly once via a
//! uniqueness-constrained insert. The insert doubles as the distributed
//! claim: whichever worker lands the row first owns the event, everyone
//! else sees `claimed = false`. Entries are never updated or deleted.

use time::OffsetDateTime;

/// One admitted event. Immutable once written.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConsumedEvent {
    pub event_id: String,
    pub event_type: String,
    pub received_at: OffsetDateTime,
}

impl ConsumedEvent {
    /// Attempt to claim `event_id` inside the caller's transaction.
    ///
    /// Returns `true` when this call inserted the row, `false` when the id
    /// was already present. A duplicate is a normal outcome, not an error;
    /// no partial state is ever visible because the claim is a single
    /// `ON CONFLICT DO NOTHING` insert.
    pub async fn claim_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: &str,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO consumed_events (event_id, event_type, payload, received_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(payload)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Total number of admitted events, for the processed-events gauge.
    pub async fn count(pool: &sqlx::PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT count(*) FROM consumed_events")
            .fetch_one(pool)
            .await
    }
}
