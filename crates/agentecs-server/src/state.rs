//! Application state for axum handlers.

use agentecs_core::VizConfig;
use agentecs_source::TickLoopSource;
use std::sync::Arc;

/// Shared application state type alias.
pub type SharedAppState = Arc<AppState>;

/// Application state for axum handlers.
///
/// A thin wrapper around the single [`TickLoopSource`] this server drives,
/// plus the config it was built from (needed by the REST handlers, which
/// don't otherwise have a reason to touch the source).
pub struct AppState {
    source: Arc<TickLoopSource>,
    config: VizConfig,
}

impl AppState {
    /// Create new application state around an already-constructed source.
    #[must_use]
    pub fn new(source: Arc<TickLoopSource>, config: VizConfig) -> Self {
        Self { source, config }
    }

    /// The tick-loop source this server drives.
    #[must_use]
    pub fn source(&self) -> &Arc<TickLoopSource> {
        &self.source
    }

    /// The configuration the server was started with.
    #[must_use]
    pub fn config(&self) -> &VizConfig {
        &self.config
    }
}
