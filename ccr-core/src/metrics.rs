//! Metric names and recording helpers.
//!
//! Counters are incremented from the dispatch layer as events flow
//! through; the database-derived totals are gauges refreshed by the
//! `metrics-gauges` scheduler job. The server installs the Prometheus
//! exporter and renders everything at `/metrics`.

use crate::entities::{ActivityFact, ConsumedEvent, IssuanceFact, TradeFact, UserDim};
use crate::events::MetricEvent;
use ccr_sdk::events::EventCategory;
use metrics::{gauge, increment_counter};
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

pub const EVENTS_PROCESSED: &str = "reporting_events_processed_total";
pub const EVENTS_DUPLICATE: &str = "reporting_events_duplicate_total";
pub const EVENTS_DEAD_LETTERED: &str = "reporting_events_dead_lettered_total";
pub const PROCESSING_ERRORS: &str = "reporting_processing_errors_total";

pub const USERS_REGISTERED: &str = "reporting_users_registered_total";
pub const USER_LOGINS: &str = "reporting_user_logins_total";
pub const TRADES_EXECUTED: &str = "reporting_trades_executed_total";
pub const CREDITS_ISSUED: &str = "reporting_credits_issued_total";
pub const PAYMENTS_COMPLETED: &str = "reporting_payments_completed_total";
pub const PAYMENTS_FAILED: &str = "reporting_payments_failed_total";

pub const USERS_TOTAL: &str = "reporting_users_total";
pub const TRADES_TOTAL: &str = "reporting_trades_total";
pub const ISSUANCES_TOTAL: &str = "reporting_issuances_total";
pub const EVENTS_CONSUMED_TOTAL: &str = "reporting_events_consumed_total";
pub const ACTIVITIES_TODAY: &str = "reporting_activities_today";
pub const TRADE_VOLUME_TOTAL: &str = "reporting_trade_volume_total";
pub const CREDITS_TCO2E_TOTAL: &str = "reporting_credits_tco2e_total";

/// Record a business-metric side effect emitted by a handler.
pub fn record_metric_event(event: MetricEvent) {
    match event {
        MetricEvent::UserRegistered => increment_counter!(USERS_REGISTERED),
        MetricEvent::UserLogin => increment_counter!(USER_LOGINS),
        MetricEvent::TradeExecuted => increment_counter!(TRADES_EXECUTED),
        MetricEvent::CreditIssued => increment_counter!(CREDITS_ISSUED),
        MetricEvent::PaymentCompleted => increment_counter!(PAYMENTS_COMPLETED),
        MetricEvent::PaymentFailed => increment_counter!(PAYMENTS_FAILED),
    }
}

pub fn record_event_processed(category: EventCategory) {
    increment_counter!(EVENTS_PROCESSED, "category" => category.as_str());
}

pub fn record_duplicate(category: EventCategory) {
    increment_counter!(EVENTS_DUPLICATE, "category" => category.as_str());
}

pub fn record_dead_letter(category: EventCategory) {
    increment_counter!(EVENTS_DEAD_LETTERED, "category" => category.as_str());
}

pub fn record_processing_error(category: EventCategory) {
    increment_counter!(PROCESSING_ERRORS, "category" => category.as_str());
}

/// Refresh the database-derived total gauges.
pub async fn update_gauges(pool: &PgPool) -> Result<(), sqlx::Error> {
    gauge!(USERS_TOTAL, UserDim::count(pool).await? as f64);
    gauge!(TRADES_TOTAL, TradeFact::count(pool).await? as f64);
    gauge!(ISSUANCES_TOTAL, IssuanceFact::count(pool).await? as f64);
    gauge!(EVENTS_CONSUMED_TOTAL, ConsumedEvent::count(pool).await? as f64);
    gauge!(ACTIVITIES_TODAY, ActivityFact::count_today(pool).await? as f64);

    let volume = TradeFact::total_volume(pool).await?;
    gauge!(TRADE_VOLUME_TOTAL, volume.to_f64().unwrap_or(f64::MAX));

    let credits = IssuanceFact::total_tco2e(pool).await?;
    gauge!(CREDITS_TCO2E_TOTAL, credits.to_f64().unwrap_or(f64::MAX));

    Ok(())
}
