//! Wire contract for the carbon credit market reporting service.
//!
//! This crate defines the shapes that cross process boundaries:
//!
//! - [`events`]: the inbound business events published by the upstream
//!   services (auth, marketplace, payment, carbon module), exactly as they
//!   appear on the wire (camelCase JSON).
//! - [`admin`]: request/response objects for the operator surface
//!   (view refresh, refresh history, partition management).
//!
//! The reporting core (`ccr-core`) consumes these types; the admin/query
//! layer serializes them back out. Nothing in here touches storage.

pub mod admin;
pub mod events;

pub use events::{
    EventCategory, IssuanceEvent, IssuanceStatus, OrderStatus, PaymentEvent, PaymentStatus,
    TradeEvent, UserAction, UserEvent,
};
