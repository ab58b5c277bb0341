//! # AgentECS Test Utilities
//!
//! Shared snapshot builders used across the workspace's test suites.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fixtures;

pub use fixtures::{make_entity, make_snapshot};
