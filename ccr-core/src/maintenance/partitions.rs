//! Partition lifecycle for the monthly-partitioned fact tables.
//!
//! Two operations, both driven by `partition_metadata`:
//!
//! - **create-ahead** walks forward from each table's stored boundary in
//!   monthly steps up to `today + look-ahead`, creating missing partitions
//!   and advancing the boundary past each created month.
//! - **retire** computes a cutoff month from the table's retention and
//!   drops every partition whose `_yyyy_mm` suffix encodes an older month.
//!
//! A failure for one table or partition is logged and skipped; it never
//! aborts processing of the others.

use crate::entities::PartitionMetadata;
use sqlx::PgPool;
use time::{Date, Month};
use tracing::{error, info, warn};

/// Months of partitions kept provisioned beyond today by default.
pub const DEFAULT_CREATE_AHEAD_MONTHS: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// Not a managed table (no `partition_metadata` row). Also guards the
    /// DDL identifier interpolation: only names from the metadata table
    /// reach it.
    #[error("unknown partitioned table: {0}")]
    UnknownTable(String),

    #[error("invalid partition month: {year}-{month}")]
    InvalidMonth { year: i32, month: u8 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// First day of the month containing `date`.
pub fn month_start(date: Date) -> Date {
    // Day 1 is valid in every month.
    date.replace_day(1).unwrap_or(date)
}

/// First day of the month following `month`.
pub fn next_month(month: Date) -> Date {
    add_months(month_start(month), 1)
}

/// First-of-month shifted by `months` (may be negative).
pub fn add_months(date: Date, months: i32) -> Date {
    let total = date.year() * 12 + (date.month() as i32 - 1) + months;
    let year = total.div_euclid(12);
    let month = Month::try_from((total.rem_euclid(12) + 1) as u8).unwrap_or(Month::January);
    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}

/// Month starts still needing partitions: from the stored boundary through
/// the month of `today + create_ahead_months`, inclusive.
pub fn months_to_create(boundary: Date, today: Date, create_ahead_months: i32) -> Vec<Date> {
    let target = month_start(add_months(today, create_ahead_months));
    let mut months = Vec::new();
    let mut current = month_start(boundary);
    while current <= target {
        months.push(current);
        current = next_month(current);
    }
    months
}

/// `<table>_<yyyy>_<mm>` for the partition covering `month`.
pub fn partition_name(table: &str, month: Date) -> String {
    format!("{table}_{:04}_{:02}", month.year(), month.month() as u8)
}

/// Parse the `_yyyy_mm` suffix of a partition name into that month's
/// first day. Returns `None` for names without a well-formed suffix.
pub fn parse_partition_month(name: &str) -> Option<Date> {
    let mut parts = name.rsplitn(3, '_');
    let month_part = parts.next()?;
    let year_part = parts.next()?;
    parts.next()?;

    if month_part.len() != 2 || year_part.len() != 4 {
        return None;
    }
    let month: u8 = month_part.parse().ok()?;
    let year: i32 = year_part.parse().ok()?;
    Date::from_calendar_date(year, Month::try_from(month).ok()?, 1).ok()
}

/// Identifiers interpolated into DDL must look like the snake_case table
/// names this service owns.
fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Create-ahead pass over every managed table.
pub async fn create_ahead(pool: &PgPool, today: Date, create_ahead_months: i32) {
    info!("starting partition create-ahead job");

    let tables = match PartitionMetadata::all(pool).await {
        Ok(tables) => tables,
        Err(err) => {
            error!(error = %err, "failed to read partition metadata");
            return;
        }
    };

    for meta in tables {
        if let Err(err) = create_for_table(pool, &meta, today, create_ahead_months).await {
            error!(
                table = %meta.table_name,
                error = %err,
                "partition creation failed, continuing with next table"
            );
        }
    }

    info!("partition create-ahead job completed");
}

async fn create_for_table(
    pool: &PgPool,
    meta: &PartitionMetadata,
    today: Date,
    create_ahead_months: i32,
) -> Result<(), sqlx::Error> {
    if !is_safe_identifier(&meta.table_name) {
        warn!(table = %meta.table_name, "refusing unsafe table name");
        return Ok(());
    }

    for month in months_to_create(meta.last_partition_date, today, create_ahead_months) {
        let name = partition_name(&meta.table_name, month);
        let upper = next_month(month);
        match create_partition(pool, &meta.table_name, &name, month, upper).await {
            Ok(()) => {
                info!(table = %meta.table_name, partition = %name, "created partition");
                PartitionMetadata::advance_boundary(pool, &meta.table_name, upper).await?;
            }
            Err(err) => {
                // Stop this table's walk so the boundary never advances
                // past a missing month; the next run retries from here.
                error!(
                    table = %meta.table_name,
                    partition = %name,
                    error = %err,
                    "failed to create partition"
                );
                break;
            }
        }
    }
    Ok(())
}

async fn create_partition(
    pool: &PgPool,
    parent: &str,
    name: &str,
    from: Date,
    to: Date,
) -> Result<(), sqlx::Error> {
    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {name} PARTITION OF {parent} \
         FOR VALUES FROM ('{from}') TO ('{to}')"
    );
    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}

/// Retire pass over every managed table.
pub async fn retire(pool: &PgPool, today: Date) {
    info!("starting partition retire job");

    let tables = match PartitionMetadata::all(pool).await {
        Ok(tables) => tables,
        Err(err) => {
            error!(error = %err, "failed to read partition metadata");
            return;
        }
    };

    for meta in tables {
        if let Err(err) = retire_for_table(pool, &meta, today).await {
            error!(
                table = %meta.table_name,
                error = %err,
                "partition retirement failed, continuing with next table"
            );
        }
    }

    info!("partition retire job completed");
}

async fn retire_for_table(
    pool: &PgPool,
    meta: &PartitionMetadata,
    today: Date,
) -> Result<(), sqlx::Error> {
    let cutoff = month_start(add_months(today, -meta.retention_months));
    let partitions = PartitionMetadata::existing_partitions(pool, &meta.table_name).await?;

    for name in partitions {
        let Some(month) = parse_partition_month(&name) else {
            warn!(partition = %name, "could not parse month from partition name");
            continue;
        };
        if month >= cutoff {
            continue;
        }
        if !is_safe_identifier(&name) {
            warn!(partition = %name, "refusing unsafe partition name");
            continue;
        }
        match sqlx::query(&format!("DROP TABLE IF EXISTS {name}")).execute(pool).await {
            Ok(_) => info!(partition = %name, "dropped expired partition"),
            Err(err) => error!(
                partition = %name,
                error = %err,
                "failed to drop partition, continuing"
            ),
        }
    }
    Ok(())
}

/// Manually create the partition of `table_name` covering one month.
pub async fn create_partition_manually(
    pool: &PgPool,
    table_name: &str,
    year: i32,
    month: u8,
) -> Result<String, PartitionError> {
    let Some(meta) = PartitionMetadata::get(pool, table_name).await? else {
        return Err(PartitionError::UnknownTable(table_name.to_owned()));
    };
    if !is_safe_identifier(&meta.table_name) {
        return Err(PartitionError::UnknownTable(table_name.to_owned()));
    }

    let month_date = Month::try_from(month)
        .ok()
        .and_then(|m| Date::from_calendar_date(year, m, 1).ok())
        .ok_or(PartitionError::InvalidMonth { year, month })?;

    let name = partition_name(&meta.table_name, month_date);
    create_partition(pool, &meta.table_name, &name, month_date, next_month(month_date)).await?;
    info!(table = table_name, partition = %name, "manually created partition");
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn walk_covers_boundary_through_lookahead() {
        // Boundary at 2024-01-01 with a 3-month look-ahead provisions the
        // four partitions whose upper bounds run Feb 1 through May 1 2024
        // (inclusive); advancing past each created month leaves the stored
        // boundary at 2024-05-01.
        let months = months_to_create(date!(2024 - 01 - 01), date!(2024 - 01 - 01), 3);
        assert_eq!(
            months,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 02 - 01),
                date!(2024 - 03 - 01),
                date!(2024 - 04 - 01),
            ]
        );
        let last = months.last().copied().map(next_month);
        assert_eq!(last, Some(date!(2024 - 05 - 01)));
    }

    #[test]
    fn walk_is_empty_when_coverage_is_ahead() {
        let months = months_to_create(date!(2024 - 06 - 01), date!(2024 - 01 - 15), 3);
        assert!(months.is_empty());
    }

    #[test]
    fn walk_crosses_year_boundaries() {
        let months = months_to_create(date!(2023 - 11 - 01), date!(2023 - 11 - 10), 3);
        assert_eq!(
            months,
            vec![
                date!(2023 - 11 - 01),
                date!(2023 - 12 - 01),
                date!(2024 - 01 - 01),
                date!(2024 - 02 - 01),
            ]
        );
    }

    #[test]
    fn partition_names_encode_year_and_month() {
        assert_eq!(
            partition_name("fact_trade", date!(2024 - 02 - 01)),
            "fact_trade_2024_02"
        );
    }

    #[test]
    fn partition_month_parsing() {
        assert_eq!(
            parse_partition_month("fact_trade_2022_11"),
            Some(date!(2022 - 11 - 01))
        );
        assert_eq!(
            parse_partition_month("fact_user_activity_2023_06"),
            Some(date!(2023 - 06 - 01))
        );
        assert_eq!(parse_partition_month("fact_trade"), None);
        assert_eq!(parse_partition_month("fact_trade_2022_13"), None);
        assert_eq!(parse_partition_month("fact_trade_22_11"), None);
        assert_eq!(parse_partition_month("fact_trade_backup"), None);
    }

    #[test]
    fn retention_cutoff_drops_only_older_months() {
        // Twelve months of retention on a 2024-01-01 clock: a 2022-11
        // partition is expired, a 2023-06 partition is retained.
        let cutoff = month_start(add_months(date!(2024 - 01 - 01), -12));
        assert_eq!(cutoff, date!(2023 - 01 - 01));

        let old = parse_partition_month("fact_trade_2022_11").unwrap();
        let recent = parse_partition_month("fact_trade_2023_06").unwrap();
        assert!(old < cutoff);
        assert!(recent >= cutoff);
    }

    #[test]
    fn month_arithmetic_handles_negative_offsets() {
        assert_eq!(add_months(date!(2024 - 01 - 01), -12), date!(2023 - 01 - 01));
        assert_eq!(add_months(date!(2024 - 01 - 01), -1), date!(2023 - 12 - 01));
        assert_eq!(add_months(date!(2023 - 12 - 01), 1), date!(2024 - 01 - 01));
    }

    #[test]
    fn identifier_guard_rejects_injection() {
        assert!(is_safe_identifier("fact_trade"));
        assert!(!is_safe_identifier("fact_trade; DROP TABLE dim_users"));
        assert!(!is_safe_identifier(""));
        assert!(!is_safe_identifier("Fact_Trade"));
    }
}
