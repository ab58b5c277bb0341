//! # AgentECS Snapshot
//!
//! World/entity/component snapshot value types and the delta engine that
//! diffs and patches them.
//!
//! This crate never interprets component `data` payloads — they are opaque
//! JSON values as far as the snapshot model and the delta engine are
//! concerned.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod delta;
pub mod snapshot;

pub use delta::{apply, diff, diff_entity};
pub use snapshot::{ComponentDiff, ComponentSnapshot, EntityId, EntitySnapshot, TickDelta, WorldSnapshot};
