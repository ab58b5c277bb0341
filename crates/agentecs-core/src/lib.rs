//! # AgentECS Core
//!
//! Core types, traits, and error definitions shared across the AgentECS
//! visualizer crates.
//!
//! This crate provides:
//! - Strongly-typed identifiers (`ConnectionId`)
//! - The unified error type (`VizError`)
//! - Server configuration (`VizConfig`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod id;

pub use config::VizConfig;
pub use error::VizError;
pub use id::ConnectionId;

/// Re-export common result type.
pub type Result<T> = std::result::Result<T, VizError>;
