//! Error types for the AgentECS visualizer.
//!
//! `VizError` is the single top-level error type for the workspace. It
//! follows the disposition table of the protocol: client-input variants are
//! converted to an `error` event at the session boundary rather than
//! propagated, while `Internal` represents an infrastructure failure that
//! tears down whatever produced it.

use thiserror::Error;

/// Top-level error type for AgentECS visualizer operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// A `seek` command referenced a tick the history store does not (or no
    /// longer) retains.
    #[error("unknown tick: {0}")]
    UnknownTick(u64),

    /// A command failed schema validation: unknown tag, missing field, wrong
    /// type, or an out-of-range value.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The WebSocket connection has already been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// A payload failed to serialize or deserialize as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value was invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error (catch-all for infrastructure failures).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tick_message() {
        let err = VizError::UnknownTick(42);
        assert_eq!(err.to_string(), "unknown tick: 42");
    }

    #[test]
    fn invalid_command_message() {
        let err = VizError::InvalidCommand("negative tick".to_string());
        assert_eq!(err.to_string(), "invalid command: negative tick");
    }

    #[test]
    fn serialization_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: VizError = json_err.into();
        assert!(matches!(err, VizError::Serialization(_)));
    }

    #[test]
    fn internal_from_anyhow() {
        let err: VizError = anyhow::anyhow!("disk on fire").into();
        assert!(matches!(err, VizError::Internal(_)));
    }
}
