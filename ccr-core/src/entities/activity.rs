//! Append-only user activity facts.

use time::OffsetDateTime;

/// One recorded user activity occurrence.
#[derive(Debug, Clone)]
pub struct ActivityFact;

impl ActivityFact {
    /// Append an activity row. Never conflicts: every occurrence is kept.
    pub async fn insert_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: i64,
        event_type: &str,
        event_data: &serde_json::Value,
        occurred_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO fact_user_activity (user_id, event_type, event_data, occurred_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(event_type)
        .bind(event_data)
        .bind(occurred_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Activities recorded since the start of the current day.
    pub async fn count_today(pool: &sqlx::PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT count(*) FROM fact_user_activity WHERE occurred_at > CURRENT_DATE",
        )
        .fetch_one(pool)
        .await
    }
}
