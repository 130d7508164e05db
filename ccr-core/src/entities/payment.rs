//! Payment facts keyed by payment id and status timestamp.

use rust_decimal::Decimal;
use time::OffsetDateTime;

/// A payment fact row, as upserted into `fact_payment`.
#[derive(Debug, Clone)]
pub struct PaymentFact {
    pub payment_id: String,
    pub order_id: Option<String>,
    pub payer_id: Option<String>,
    pub payee_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_method: Option<String>,
    /// The most significant status timestamp the event carried
    /// (completed, else failed, else initiated).
    pub completed_at: OffsetDateTime,
    pub region: Option<String>,
    pub status_changed_at: OffsetDateTime,
}

impl PaymentFact {
    /// Upsert on `(payment_id, completed_at)`, overwriting status fields
    /// unconditionally (last write wins, see `TradeFact::upsert_tx`).
    pub async fn upsert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO fact_payment
                (payment_id, order_id, payer_id, payee_id, amount, currency,
                 status, payment_method, completed_at, region, status_changed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (payment_id, completed_at) DO UPDATE SET
                order_id = EXCLUDED.order_id,
                payer_id = EXCLUDED.payer_id,
                payee_id = EXCLUDED.payee_id,
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                status = EXCLUDED.status,
                payment_method = EXCLUDED.payment_method,
                region = EXCLUDED.region,
                status_changed_at = EXCLUDED.status_changed_at
            "#,
        )
        .bind(&self.payment_id)
        .bind(&self.order_id)
        .bind(&self.payer_id)
        .bind(&self.payee_id)
        .bind(self.amount)
        .bind(&self.currency)
        .bind(&self.status)
        .bind(&self.payment_method)
        .bind(self.completed_at)
        .bind(&self.region)
        .bind(self.status_changed_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
