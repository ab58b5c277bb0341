//! Client → server commands.

use agentecs_core::VizError;
use serde::{Deserialize, Serialize};

/// A playback-control command sent by a client.
///
/// Deserializing directly enforces most of the wire contract: an unknown
/// `command` tag, a missing required field, or a field of the wrong JSON
/// type (including a JSON boolean where a number is required) all fail
/// deserialization rather than producing a half-valid command. What
/// deserialization cannot catch — a `ticks_per_second` that parses as a
/// number but isn't positive — is caught by [`parse_command`] afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Stop advancing simulated time.
    Pause,
    /// Resume advancing simulated time.
    Resume,
    /// Advance exactly one tick. Only meaningful while paused.
    Step,
    /// Request the historical snapshot at a specific tick.
    Seek {
        /// Tick to reconstruct. Deserialization itself rejects negative
        /// values since the field is unsigned.
        tick: u64,
    },
    /// Change the simulated tick rate.
    SetSpeed {
        /// New rate, in ticks per second. Must be finite and positive.
        ticks_per_second: f64,
    },
}

/// Parse and fully validate a command from raw JSON text.
///
/// Returns [`VizError::InvalidCommand`] for both deserialization failures
/// (unknown tag, missing field, wrong type) and for semantically invalid
/// values that deserialize cleanly but violate the protocol (zero/negative
/// `ticks_per_second`, non-finite `ticks_per_second`).
pub fn parse_command(raw: &str) -> Result<ClientCommand, VizError> {
    let command: ClientCommand =
        serde_json::from_str(raw).map_err(|e| VizError::InvalidCommand(e.to_string()))?;

    if let ClientCommand::SetSpeed { ticks_per_second } = &command {
        if !ticks_per_second.is_finite() || *ticks_per_second <= 0.0 {
            return Err(VizError::InvalidCommand(format!(
                "ticks_per_second must be a positive number, got {ticks_per_second}"
            )));
        }
    }

    Ok(command)
}
