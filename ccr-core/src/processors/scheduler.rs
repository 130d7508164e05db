//! Scheduler for the periodic maintenance jobs.
//!
//! The scheduler owns an explicit list of named job definitions with
//! their intervals and injected database handle; there is no ambient
//! global state. Each job runs on its own timer task and may overlap
//! consumer activity, but every job's writes are scoped to its own
//! table/row set, so jobs never interleave destructively with each other.
//! A job tick that errors is caught and logged; sibling jobs and later
//! ticks are unaffected.

use crate::maintenance::{partitions, refresh};
use crate::metrics;
use sqlx::PgPool;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// What a job does on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Hourly full refresh of every registered view (blocks readers).
    RefreshAllBlocking,
    /// Nightly non-blocking refresh pass, tolerant of per-view failure.
    RefreshAllConcurrent,
    /// Prune the refresh log to its per-view retention bound.
    PruneRefreshLog,
    /// Pre-create future monthly partitions.
    PartitionCreateAhead,
    /// Drop partitions past retention.
    PartitionRetire,
    /// Recompute the database-derived metric gauges.
    UpdateGauges,
}

/// A named periodic job.
#[derive(Debug, Clone, Copy)]
pub struct JobDef {
    pub name: &'static str,
    pub every: Duration,
    pub kind: JobKind,
}

/// Intervals and knobs for the default job set.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub refresh_interval: Duration,
    pub nightly_refresh_interval: Duration,
    pub log_cleanup_interval: Duration,
    pub partition_interval: Duration,
    pub gauge_interval: Duration,
    pub create_ahead_months: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 60),
            nightly_refresh_interval: Duration::from_secs(24 * 60 * 60),
            log_cleanup_interval: Duration::from_secs(24 * 60 * 60),
            partition_interval: Duration::from_secs(24 * 60 * 60),
            gauge_interval: Duration::from_secs(30),
            create_ahead_months: partitions::DEFAULT_CREATE_AHEAD_MONTHS,
        }
    }
}

/// Owns the job definitions and spawns one timer loop per job.
pub struct Scheduler {
    pool: PgPool,
    jobs: Vec<JobDef>,
    create_ahead_months: i32,
}

impl Scheduler {
    /// Build the standard job set from the configuration.
    pub fn with_default_jobs(pool: PgPool, config: SchedulerConfig) -> Self {
        let jobs = vec![
            JobDef {
                name: "mv-refresh-hourly",
                every: config.refresh_interval,
                kind: JobKind::RefreshAllBlocking,
            },
            JobDef {
                name: "mv-refresh-concurrent-nightly",
                every: config.nightly_refresh_interval,
                kind: JobKind::RefreshAllConcurrent,
            },
            JobDef {
                name: "mv-log-cleanup",
                every: config.log_cleanup_interval,
                kind: JobKind::PruneRefreshLog,
            },
            JobDef {
                name: "partition-create-ahead",
                every: config.partition_interval,
                kind: JobKind::PartitionCreateAhead,
            },
            JobDef {
                name: "partition-retire",
                every: config.partition_interval,
                kind: JobKind::PartitionRetire,
            },
            JobDef {
                name: "metrics-gauges",
                every: config.gauge_interval,
                kind: JobKind::UpdateGauges,
            },
        ];
        Self {
            pool,
            jobs,
            create_ahead_months: config.create_ahead_months,
        }
    }

    pub fn jobs(&self) -> &[JobDef] {
        &self.jobs
    }

    /// Spawn every job as its own interval loop holding the shared
    /// shutdown receiver.
    pub fn spawn(self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        self.jobs
            .iter()
            .map(|job| {
                let job = *job;
                let pool = self.pool.clone();
                let create_ahead_months = self.create_ahead_months;
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    info!(job = job.name, every_secs = job.every.as_secs(), "job scheduled");
                    let mut ticker = tokio::time::interval(job.every);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    // The first tick completes immediately; consume it so
                    // every job waits one full period after startup.
                    ticker.tick().await;

                    loop {
                        tokio::select! {
                            biased;

                            _ = shutdown_rx.changed() => {
                                if *shutdown_rx.borrow() {
                                    info!(job = job.name, "job received shutdown signal");
                                    break;
                                }
                            }

                            _ = ticker.tick() => {
                                debug!(job = job.name, "job tick");
                                run_job(&pool, job.kind, create_ahead_months).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }
}

/// Run one tick of a job, converting every failure into a log line.
async fn run_job(pool: &PgPool, kind: JobKind, create_ahead_months: i32) {
    let today = OffsetDateTime::now_utc().date();
    match kind {
        JobKind::RefreshAllBlocking => {
            let response = refresh::refresh_all(pool, refresh::RefreshMode::Blocking).await;
            info!(
                views = response.outcomes.len(),
                duration_ms = response.duration_ms,
                "scheduled refresh of all materialized views completed"
            );
        }
        JobKind::RefreshAllConcurrent => {
            let response = refresh::refresh_all(pool, refresh::RefreshMode::Concurrent).await;
            info!(
                views = response.outcomes.len(),
                duration_ms = response.duration_ms,
                "concurrent refresh of all materialized views completed"
            );
        }
        JobKind::PruneRefreshLog => {
            if let Err(err) = refresh::prune_refresh_log(pool).await {
                error!(error = %err, "refresh log cleanup failed");
            }
        }
        JobKind::PartitionCreateAhead => {
            partitions::create_ahead(pool, today, create_ahead_months).await;
        }
        JobKind::PartitionRetire => {
            partitions::retire(pool, today).await;
        }
        JobKind::UpdateGauges => {
            if let Err(err) = metrics::update_gauges(pool).await {
                error!(error = %err, "metric gauge update failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_job_set_is_complete_and_uniquely_named() {
        let pool = PgPool::connect_lazy("postgres://localhost/reporting").unwrap();
        let scheduler = Scheduler::with_default_jobs(pool, SchedulerConfig::default());

        let names: Vec<_> = scheduler.jobs().iter().map(|job| job.name).collect();
        assert_eq!(
            names,
            vec![
                "mv-refresh-hourly",
                "mv-refresh-concurrent-nightly",
                "mv-log-cleanup",
                "partition-create-ahead",
                "partition-retire",
                "metrics-gauges",
            ]
        );

        // Job names double as isolation scopes; duplicates would mean two
        // timers writing the same rows.
        let mut seen = std::collections::HashSet::new();
        assert!(names.iter().all(|name| seen.insert(*name)));
        assert!(scheduler.jobs().iter().all(|job| !job.every.is_zero()));
    }
}
