//! Maintenance operations over the reporting store: materialized-view
//! refresh and partition lifecycle. Invoked both by the scheduler's
//! periodic jobs and on demand through the operator surface.

pub mod partitions;
pub mod refresh;

pub use partitions::{DEFAULT_CREATE_AHEAD_MONTHS, PartitionError};
pub use refresh::{REGISTERED_VIEWS, RefreshError, RefreshMode, STALENESS_THRESHOLD};
