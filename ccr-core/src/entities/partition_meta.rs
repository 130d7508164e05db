//! Partition bookkeeping for the monthly-partitioned fact tables.
//!
//! `partition_metadata` is written only by the partition lifecycle jobs.
//! The physical partition catalog is read from `pg_tables`.

use crate::framework::DatabaseProcessor;
use ccr_sdk::admin::PartitionInfo;
use kanau::processor::Processor;
use time::Date;

/// Per-table partition metadata.
///
/// `last_partition_date` is the upper boundary (exclusive end) of the
/// newest provisioned partition.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartitionMetadata {
    pub table_name: String,
    pub last_partition_date: Date,
    pub retention_months: i32,
}

impl PartitionMetadata {
    /// All managed tables.
    pub async fn all(pool: &sqlx::PgPool) -> Result<Vec<PartitionMetadata>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT table_name, last_partition_date, retention_months
            FROM partition_metadata
            ORDER BY table_name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Metadata for one managed table.
    pub async fn get(
        pool: &sqlx::PgPool,
        table_name: &str,
    ) -> Result<Option<PartitionMetadata>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT table_name, last_partition_date, retention_months
            FROM partition_metadata
            WHERE table_name = $1
            "#,
        )
        .bind(table_name)
        .fetch_optional(pool)
        .await
    }

    /// Advance the stored boundary after a partition has been created.
    pub async fn advance_boundary(
        pool: &sqlx::PgPool,
        table_name: &str,
        boundary: Date,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE partition_metadata
            SET last_partition_date = $2, updated_at = now()
            WHERE table_name = $1
            "#,
        )
        .bind(table_name)
        .bind(boundary)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Names of the existing partitions of `table_name`, from `pg_tables`.
    pub async fn existing_partitions(
        pool: &sqlx::PgPool,
        table_name: &str,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT tablename FROM pg_tables
            WHERE schemaname = 'public'
              AND tablename LIKE $1 || '_%'
              AND tablename ~ '^.*_[0-9]{4}_[0-9]{2}$'
            ORDER BY tablename
            "#,
        )
        .bind(table_name)
        .fetch_all(pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// List the partitions of one managed table with their on-disk sizes.
pub struct GetPartitionInfo {
    pub table_name: String,
}

impl Processor<GetPartitionInfo> for DatabaseProcessor {
    type Output = Vec<PartitionInfo>;
    type Error = sqlx::Error;

    #[tracing::instrument(skip_all, err, name = "SQL:GetPartitionInfo")]
    async fn process(&self, query: GetPartitionInfo) -> Result<Vec<PartitionInfo>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT tablename,
                   pg_size_pretty(pg_total_relation_size(schemaname || '.' || tablename))
            FROM pg_tables
            WHERE schemaname = 'public' AND tablename LIKE $1 || '_%'
            ORDER BY tablename
            "#,
        )
        .bind(&query.table_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(partition_name, size)| PartitionInfo {
                partition_name,
                size,
            })
            .collect())
    }
}
