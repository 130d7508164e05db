//! Row types and storage operations for the reporting store.
//!
//! Write paths invoked from the event handlers are inherent async fns
//! taking the enclosing `sqlx::Transaction`, so a claim and its upserts
//! commit or roll back together. Operator-surface reads follow the
//! message-per-query `Processor` pattern against
//! [`crate::framework::DatabaseProcessor`].

pub mod activity;
pub mod dead_letter;
pub mod issuance;
pub mod ledger;
pub mod notification;
pub mod partition_meta;
pub mod payment;
pub mod refresh_log;
pub mod trade;
pub mod users;

pub use activity::ActivityFact;
pub use dead_letter::DeadLetterEvent;
pub use issuance::IssuanceFact;
pub use ledger::ConsumedEvent;
pub use partition_meta::PartitionMetadata;
pub use payment::PaymentFact;
pub use refresh_log::RefreshLogEntry;
pub use trade::TradeFact;
pub use users::{UserDim, UserProfilePatch};
