//! Server configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Default number of ticks retained by the history store.
pub const DEFAULT_MAX_TICKS: usize = 1000;

/// Default number of ticks between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 50;

/// Default capacity of each subscriber's event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default interval between ticks, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Visualizer configuration.
///
/// Every field has a compiled-in default; [`VizConfig::from_env`] layers
/// environment overrides on top of those defaults, and builder methods layer
/// explicit overrides on top of that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizConfig {
    /// Host to bind the HTTP/WebSocket server to.
    pub host: String,
    /// Port to bind the HTTP/WebSocket server to.
    pub port: u16,
    /// Maximum number of ticks the history store retains.
    pub max_ticks: usize,
    /// Number of ticks between full checkpoints.
    pub checkpoint_interval: u64,
    /// Capacity of each subscriber's bounded event queue.
    pub queue_capacity: usize,
    /// Interval between simulated ticks.
    pub tick_interval: Duration,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_ticks: DEFAULT_MAX_TICKS,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

impl VizConfig {
    /// Build configuration from compiled-in defaults overridden by
    /// environment variables.
    ///
    /// Recognized variables: `AGENTECS_HOST`, `AGENTECS_PORT`,
    /// `AGENTECS_MAX_TICKS`, `AGENTECS_CHECKPOINT_INTERVAL`,
    /// `AGENTECS_QUEUE_CAPACITY`, `AGENTECS_TICK_INTERVAL_MS`. A present but
    /// unparseable value is logged and the default is kept; none are
    /// required.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("AGENTECS_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_env("AGENTECS_PORT") {
            config.port = port;
        }
        if let Some(max_ticks) = parse_env("AGENTECS_MAX_TICKS") {
            config.max_ticks = max_ticks;
        }
        if let Some(checkpoint_interval) = parse_env("AGENTECS_CHECKPOINT_INTERVAL") {
            config.checkpoint_interval = checkpoint_interval;
        }
        if let Some(queue_capacity) = parse_env("AGENTECS_QUEUE_CAPACITY") {
            config.queue_capacity = queue_capacity;
        }
        if let Some(ms) = parse_env::<u64>("AGENTECS_TICK_INTERVAL_MS") {
            config.tick_interval = Duration::from_millis(ms);
        }

        config
    }

    /// Create config bound to a specific port, defaults otherwise.
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Set the tick rate in ticks per second, overwriting `tick_interval`.
    #[must_use]
    pub fn with_tick_rate(mut self, ticks_per_second: f64) -> Self {
        self.tick_interval = Duration::from_secs_f64(1.0 / ticks_per_second);
        self
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {key}={raw:?}, keeping default");
            None
        }
    }
}
