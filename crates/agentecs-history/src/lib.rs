//! # AgentECS History
//!
//! Bounded checkpoint+delta time series of world snapshots, plus side-index
//! storage for application errors and tracing spans, and a read-only entity
//! lifecycle report derived from whatever is currently retained.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod events;
pub mod lifecycle;
pub mod store;

pub use events::{ErrorEvent, ErrorSeverity, SpanEvent, SpanStatus};
pub use lifecycle::{compute_entity_lifecycles, EntityLifecycle};
pub use store::InMemoryHistoryStore;
