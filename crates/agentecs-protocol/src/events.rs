//! Server → client events.

use agentecs_history::{ErrorEvent as ErrorTelemetry, SpanEvent as SpanTelemetry};
use agentecs_snapshot::{TickDelta, WorldSnapshot};
use serde::{Deserialize, Serialize};

/// One message on the server's outbound stream.
///
/// All payloads round-trip losslessly through JSON; tuple fields such as
/// `tick_range` serialize as two-element arrays, which is `serde`'s default
/// for a `(u64, u64)` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent exactly once, immediately after a connection is accepted.
    Metadata {
        /// Current tick at the time of connection.
        tick: u64,
        /// Opaque visualization configuration passthrough. The core never
        /// interprets this; it is forwarded from whatever the source
        /// supplied.
        #[serde(skip_serializing_if = "Option::is_none")]
        visualization: Option<serde_json::Value>,
        /// Oldest and newest ticks currently retained, if history is
        /// available.
        #[serde(skip_serializing_if = "Option::is_none")]
        tick_range: Option<(u64, u64)>,
        /// Whether `seek` is supported (i.e., a history store is attached).
        supports_history: bool,
        /// Whether the source is currently paused.
        is_paused: bool,
    },
    /// A full world snapshot, sent on connect and in response to `seek`.
    Snapshot {
        /// Tick the snapshot was taken at.
        tick: u64,
        /// The snapshot itself.
        snapshot: WorldSnapshot,
    },
    /// A bandwidth-efficient incremental update. Never sent as a `seek`
    /// response.
    ///
    /// Part of the wire contract; the bundled tick-loop driver streams
    /// `Snapshot` every tick rather than this variant. A source with a
    /// larger world can emit `Delta` on its live stream instead, without any
    /// protocol change on the client side.
    Delta {
        /// Tick the delta advances to.
        tick: u64,
        /// The delta itself.
        delta: TickDelta,
    },
    /// Compact acknowledgement of a `pause`, `resume`, or `step` command.
    TickUpdate {
        /// Current tick after the command was applied.
        tick: u64,
        /// Current entity count.
        entity_count: usize,
        /// Whether the source is now paused.
        is_paused: bool,
    },
    /// An application-level error observed by the driver.
    ErrorEvent {
        /// The error, flattened: carries `tick`, optional `entity_id`,
        /// `severity`, and `message` directly on this event.
        #[serde(flatten)]
        error: ErrorTelemetry,
    },
    /// A tracing span emitted by the driver or the simulated world.
    SpanEvent {
        /// The span, flattened: carries `span_id`, `trace_id`, and the rest
        /// directly on this event.
        #[serde(flatten)]
        span: SpanTelemetry,
    },
    /// Protocol-level error for a malformed or invalid client command.
    Error {
        /// Current tick at the time the error was reported.
        tick: u64,
        /// Human-readable description of what was wrong.
        message: String,
    },
}
