//! Carbon credit issuance facts.

use rust_decimal::Decimal;
use time::OffsetDateTime;

/// An issuance fact row, as upserted into `fact_issuance`.
///
/// `issuance_id` holds the request id until credits actually exist
/// (PENDING/REJECTED carry no issuance id), so the whole request
/// lifecycle lands on a single row.
#[derive(Debug, Clone)]
pub struct IssuanceFact {
    pub issuance_id: String,
    pub user_id: Option<i64>,
    pub vehicle_id: Option<String>,
    pub quantity_tco2e: Decimal,
    pub distance_km: Option<Decimal>,
    pub energy_kwh: Option<Decimal>,
    pub co2_avoided_kg: Option<Decimal>,
    pub issued_at: OffsetDateTime,
    pub region: Option<String>,
    pub request_id: String,
    pub status: String,
}

impl IssuanceFact {
    /// Upsert on `(issuance_id, issued_at)`, overwriting mutable fields
    /// unconditionally (last write wins, see `TradeFact::upsert_tx`).
    pub async fn upsert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO fact_issuance
                (issuance_id, user_id, vehicle_id, quantity_tco2e, distance_km,
                 energy_kwh, co2_avoided_kg, issued_at, region, request_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (issuance_id, issued_at) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                vehicle_id = EXCLUDED.vehicle_id,
                quantity_tco2e = EXCLUDED.quantity_tco2e,
                distance_km = EXCLUDED.distance_km,
                energy_kwh = EXCLUDED.energy_kwh,
                co2_avoided_kg = EXCLUDED.co2_avoided_kg,
                region = EXCLUDED.region,
                request_id = EXCLUDED.request_id,
                status = EXCLUDED.status
            "#,
        )
        .bind(&self.issuance_id)
        .bind(self.user_id)
        .bind(&self.vehicle_id)
        .bind(self.quantity_tco2e)
        .bind(self.distance_km)
        .bind(self.energy_kwh)
        .bind(self.co2_avoided_kg)
        .bind(self.issued_at)
        .bind(&self.region)
        .bind(&self.request_id)
        .bind(&self.status)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Total issuance count, for the issuances gauge.
    pub async fn count(pool: &sqlx::PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT count(*) FROM fact_issuance")
            .fetch_one(pool)
            .await
    }

    /// Total issued tCO2e, for the credits gauge.
    pub async fn total_tco2e(pool: &sqlx::PgPool) -> Result<Decimal, sqlx::Error> {
        sqlx::query_scalar("SELECT COALESCE(sum(quantity_tco2e), 0) FROM fact_issuance")
            .fetch_one(pool)
            .await
    }
}
