#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

//! Ingestion-and-consistency core of the carbon credit market reporting
//! service.
//!
//! Business events published by the upstream services are consumed from
//! per-category queues, claimed exactly once through the idempotency
//! ledger, and folded into the denormalized reporting store. Scheduled
//! jobs keep the pre-aggregated materialized views fresh and manage the
//! monthly time partitions of the fact tables.

pub mod entities;
pub mod events;
pub mod framework;
pub mod handlers;
pub mod maintenance;
pub mod metrics;
pub mod processors;
