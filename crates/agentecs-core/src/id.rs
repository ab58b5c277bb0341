//! Strongly-typed identifiers for AgentECS visualizer sessions.
//!
//! A newtype wrapper keeps a connection identifier from being confused with
//! an entity id or a bare tick number at a call site.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Uniquely identifies a client WebSocket connection for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn connection_id_display() {
        let id = ConnectionId::new();
        let display = format!("{id}");
        assert!(display.starts_with("Connection("));
        assert!(display.ends_with(')'));
    }

    #[test]
    fn connection_id_default_is_unique_each_call() {
        let a = ConnectionId::default();
        let b = ConnectionId::default();
        assert_ne!(a, b);
    }

    #[test]
    fn connection_id_serialize_roundtrip() {
        let id = ConnectionId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let parsed: ConnectionId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(id, parsed);
    }

    #[test]
    fn connection_id_hashes_correctly() {
        use std::collections::HashMap;

        let id = ConnectionId::new();
        let mut map: HashMap<ConnectionId, &str> = HashMap::new();
        map.insert(id, "session");
        assert_eq!(map.get(&id), Some(&"session"));
    }
}
