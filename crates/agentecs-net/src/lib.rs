//! # AgentECS Net
//!
//! HTTP server plumbing shared across the visualizer binary: a router
//! builder with common middleware, and a cross-platform shutdown signal.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod server;

pub use server::{shutdown_signal, ServerBuilder, ServerConfig};
