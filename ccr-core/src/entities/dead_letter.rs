//! Dead-letter sink for messages that could not be processed.

use crate::events::DeadLetter;

pub struct DeadLetterEvent;

impl DeadLetterEvent {
    /// Persist a dead-lettered message for manual inspection.
    pub async fn insert(pool: &sqlx::PgPool, letter: &DeadLetter) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO dead_letter_events
                (category, payload, error_kind, error_message, received_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(letter.category.to_string())
        .bind(&letter.payload)
        .bind(letter.error_kind)
        .bind(&letter.error_message)
        .bind(letter.received_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}
