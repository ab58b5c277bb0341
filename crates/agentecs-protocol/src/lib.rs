//! # AgentECS Protocol
//!
//! The typed, discriminated-union wire protocol between server and client:
//! playback-control commands in one direction, world state and telemetry
//! events in the other.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod commands;
pub mod events;

pub use commands::{parse_command, ClientCommand};
pub use events::ServerEvent;
