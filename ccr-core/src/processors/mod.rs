//! Long-running processors of the ingestion pipeline.
//!
//! - `EventConsumer`: one per category, pulls deliveries, claims and
//!   upserts, applies side effects after commit
//! - `DeadLetterWriter`: persists rejected messages for inspection
//! - `NotificationWriter`: persists notification side effects
//! - `Scheduler`: owns the periodic maintenance jobs

pub mod consumer;
pub mod notifier;
pub mod scheduler;

pub use consumer::{DeadLetterWriter, DispatchOutcome, EventConsumer, MAX_IN_FLIGHT};
pub use notifier::NotificationWriter;
pub use scheduler::{JobDef, JobKind, Scheduler, SchedulerConfig};
