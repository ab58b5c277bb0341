//! Telemetry event types recorded alongside snapshots: application-level
//! errors and tracing spans.

use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Severity of an application-level error observed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// The driver cannot continue safely.
    Critical,
    /// Something is wrong but the driver can continue.
    Warning,
    /// Informational only.
    Info,
}

/// An application-level error observed at a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// Tick at which the error was observed.
    pub tick: u64,
    /// Entity the error concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<u64>,
    /// Severity of the error.
    pub severity: ErrorSeverity,
    /// Human-readable description.
    pub message: String,
}

/// Completion status of a tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanStatus {
    /// The span completed without error.
    Ok,
    /// The span completed with an error.
    Error,
    /// No status was recorded.
    Unset,
}

/// Key under which a span's originating tick is carried in `attributes`.
pub const TICK_ATTRIBUTE: &str = "agentecs.tick";

/// Key under which a span's originating entity, if any, is carried in
/// `attributes`.
pub const ENTITY_ATTRIBUTE: &str = "agentecs.entity_id";

/// A tracing span emitted by the driver or the simulated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEvent {
    /// Unique id of this span.
    pub span_id: String,
    /// Id of the trace this span belongs to.
    pub trace_id: String,
    /// Id of the enclosing span, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    /// Human-readable span name.
    pub name: String,
    /// Start time, wall-clock seconds.
    pub start_time: f64,
    /// End time, wall-clock seconds.
    pub end_time: f64,
    /// Completion status.
    pub status: SpanStatus,
    /// Free-form attributes. Always carries [`TICK_ATTRIBUTE`]; carries
    /// [`ENTITY_ATTRIBUTE`] when the span concerns a specific entity.
    pub attributes: Map<String, serde_json::Value>,
}

impl SpanEvent {
    /// The tick this span was recorded at, extracted from `attributes`.
    ///
    /// Returns `None` if the attribute is absent or not representable as a
    /// nonnegative integer; such spans are not indexed by tick.
    #[must_use]
    pub fn tick(&self) -> Option<u64> {
        self.attributes.get(TICK_ATTRIBUTE).and_then(serde_json::Value::as_u64)
    }

    /// The entity this span concerns, if recorded in `attributes`.
    #[must_use]
    pub fn entity_id(&self) -> Option<u64> {
        self.attributes.get(ENTITY_ATTRIBUTE).and_then(serde_json::Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_tick_extracted_from_attributes() {
        let mut attributes = Map::new();
        attributes.insert(TICK_ATTRIBUTE.to_string(), serde_json::json!(7));
        let span = SpanEvent {
            span_id: "s1".to_string(),
            trace_id: "t1".to_string(),
            parent_span_id: None,
            name: "tick".to_string(),
            start_time: 0.0,
            end_time: 0.1,
            status: SpanStatus::Ok,
            attributes,
        };
        assert_eq!(span.tick(), Some(7));
        assert_eq!(span.entity_id(), None);
    }

    #[test]
    fn span_tick_missing_is_none() {
        let span = SpanEvent {
            span_id: "s1".to_string(),
            trace_id: "t1".to_string(),
            parent_span_id: None,
            name: "tick".to_string(),
            start_time: 0.0,
            end_time: 0.1,
            status: SpanStatus::Unset,
            attributes: Map::new(),
        };
        assert_eq!(span.tick(), None);
    }

    #[test]
    fn error_severity_serializes_lowercase() {
        let json = serde_json::to_string(&ErrorSeverity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
