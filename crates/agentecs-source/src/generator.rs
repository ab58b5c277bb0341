//! The pluggable hook through which a concrete simulation feeds the driver.
//!
//! The tick-loop driver never interprets component payloads or simulation
//! logic itself; it delegates world advancement to a [`WorldGenerator`] and
//! only concerns itself with cadence, recording, and fan-out.

use agentecs_history::{ErrorEvent, SpanEvent};
use agentecs_snapshot::WorldSnapshot;

/// Produces world state, one tick at a time.
///
/// Implementations own whatever ECS engine or fake-world logic backs the
/// simulation; the driver calls [`advance`](WorldGenerator::advance) once per
/// tick and treats the result as opaque.
pub trait WorldGenerator: Send {
    /// Produce the world snapshot for `tick`, given the wall-clock
    /// `timestamp` the tick was taken at.
    fn advance(&mut self, tick: u64, timestamp: f64) -> WorldSnapshot;

    /// Ancillary telemetry produced incidentally by this tick, if any.
    ///
    /// Called once immediately after [`advance`](WorldGenerator::advance).
    /// The default implementation produces nothing.
    fn ancillary_events(&mut self, _tick: u64) -> (Vec<ErrorEvent>, Vec<SpanEvent>) {
        (Vec::new(), Vec::new())
    }

    /// Opaque visualization configuration forwarded verbatim to clients in
    /// the `metadata` event (world display name, archetype display hints,
    /// and the like). The driver and protocol never interpret it. The
    /// default implementation has none.
    fn visualization_config(&self) -> Option<serde_json::Value> {
        None
    }
}
