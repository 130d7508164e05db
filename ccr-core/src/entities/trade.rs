//! Trade facts keyed by order id and execution time.

use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

/// A trade fact row, as upserted into `fact_trade`.
#[derive(Debug, Clone)]
pub struct TradeFact {
    pub order_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub currency: String,
    pub executed_at: OffsetDateTime,
    pub region: Option<String>,
    pub is_auction: bool,
    pub order_status: String,
    pub status_changed_at: OffsetDateTime,
}

impl TradeFact {
    /// Upsert on `(order_id, executed_at)`.
    ///
    /// Conflicts overwrite every mutable column with the incoming values.
    /// There is deliberately no timestamp guard: the idempotency ledger
    /// already rejects replays, and status transitions for the same order
    /// are expected to overwrite (last write wins).
    pub async fn upsert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO fact_trade
                (order_id, listing_id, buyer_id, seller_id, quantity, unit, unit_price,
                 amount, currency, executed_at, region, is_auction, order_status, status_changed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (order_id, executed_at) DO UPDATE SET
                listing_id = EXCLUDED.listing_id,
                buyer_id = EXCLUDED.buyer_id,
                seller_id = EXCLUDED.seller_id,
                quantity = EXCLUDED.quantity,
                unit = EXCLUDED.unit,
                unit_price = EXCLUDED.unit_price,
                amount = EXCLUDED.amount,
                currency = EXCLUDED.currency,
                region = EXCLUDED.region,
                is_auction = EXCLUDED.is_auction,
                order_status = EXCLUDED.order_status,
                status_changed_at = EXCLUDED.status_changed_at
            "#,
        )
        .bind(self.order_id)
        .bind(self.listing_id)
        .bind(self.buyer_id)
        .bind(self.seller_id)
        .bind(self.quantity)
        .bind(&self.unit)
        .bind(self.unit_price)
        .bind(self.amount)
        .bind(&self.currency)
        .bind(self.executed_at)
        .bind(&self.region)
        .bind(self.is_auction)
        .bind(&self.order_status)
        .bind(self.status_changed_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Total trade count, for the trades gauge.
    pub async fn count(pool: &sqlx::PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT count(*) FROM fact_trade")
            .fetch_one(pool)
            .await
    }

    /// Total traded amount, for the volume gauge.
    pub async fn total_volume(pool: &sqlx::PgPool) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(sum(amount), 0) FROM fact_trade")
            .fetch_one(pool)
            .await
    }
}
