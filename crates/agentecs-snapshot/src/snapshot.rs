//! Value types for world/entity/component snapshots and tick deltas.
//!
//! These are plain, fully-owned value types: cloning a snapshot deep-copies
//! it, and equality is structural. Field order in the serialized JSON is
//! whatever `serde` derives for the struct, which is stable across builds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Strongly-typed entity identifier.
///
/// A thin wrapper around the nonnegative integer id so it can't be confused
/// with a tick number or a raw array index at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A single component attached to an entity.
///
/// `type_name` is the fully-qualified type identifier (cross-process
/// disambiguation); `type_short` is the display label and the key used for
/// diffing. `data` is an opaque JSON-compatible payload the core never
/// interprets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    /// Fully-qualified type identifier.
    pub type_name: String,
    /// Display label; unique within one entity's components.
    pub type_short: String,
    /// Opaque, structured payload.
    pub data: serde_json::Value,
}

/// An entity and its components at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity identifier, unique within its snapshot.
    pub id: EntityId,
    /// Components attached to this entity, at most one per `type_short`.
    pub components: Vec<ComponentSnapshot>,
}

impl EntitySnapshot {
    /// Create an entity snapshot with no components.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            components: Vec::new(),
        }
    }

    /// Look up a component by its `type_short` key.
    #[must_use]
    pub fn component(&self, type_short: &str) -> Option<&ComponentSnapshot> {
        self.components.iter().find(|c| c.type_short == type_short)
    }

    /// The sorted tuple of `type_short` values — the equivalence class this
    /// entity belongs to for visualization grouping.
    #[must_use]
    pub fn archetype(&self) -> Vec<String> {
        let mut types: Vec<String> = self.components.iter().map(|c| c.type_short.clone()).collect();
        types.sort_unstable();
        types
    }
}

/// Full state of the simulated world at one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Monotonic tick index.
    pub tick: u64,
    /// Wall-clock time the snapshot was taken, in seconds.
    pub timestamp: f64,
    /// All entities present at this tick, unique by id.
    pub entities: Vec<EntitySnapshot>,
    /// Free-form metadata carried alongside the snapshot.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl WorldSnapshot {
    /// Create an empty snapshot at the given tick.
    #[must_use]
    pub fn new(tick: u64, timestamp: f64) -> Self {
        Self {
            tick,
            timestamp,
            entities: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Number of entities in this snapshot.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The set of distinct archetypes present, sorted.
    #[must_use]
    pub fn archetypes(&self) -> Vec<Vec<String>> {
        let mut archetypes: Vec<Vec<String>> = self.entities.iter().map(EntitySnapshot::archetype).collect();
        archetypes.sort();
        archetypes.dedup();
        archetypes
    }
}

/// The difference observed in one component of one entity between two
/// snapshots.
///
/// Exactly one of `added`, `removed`, `modified` is valid per the
/// `old_value`/`new_value` combination: `(None, Some(_))` is added,
/// `(Some(_), None)` is removed, `(Some(x), Some(y))` with `x != y` is
/// modified. `(Some(x), Some(x))` must never be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDiff {
    /// The `type_short` key this diff is about.
    pub component_type: String,
    /// The fully-qualified type name, resolved from whichever side of the
    /// comparison was non-null.
    pub type_name: String,
    /// Value before the change, or `None` if the component was added.
    pub old_value: Option<serde_json::Value>,
    /// Value after the change, or `None` if the component was removed.
    pub new_value: Option<serde_json::Value>,
}

/// The changes between two consecutive ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickDelta {
    /// Tick this delta produces when applied.
    pub tick: u64,
    /// Wall-clock time, in seconds.
    pub timestamp: f64,
    /// Entities present in the successor snapshot but not the predecessor.
    #[serde(default)]
    pub spawned: Vec<EntitySnapshot>,
    /// Ids present in the predecessor snapshot but not the successor.
    #[serde(default)]
    pub destroyed: Vec<u64>,
    /// Per-entity component diffs, keyed by entity id. Every key here is
    /// present in both the predecessor and successor snapshots.
    #[serde(default)]
    pub modified: BTreeMap<u64, Vec<ComponentDiff>>,
}

impl TickDelta {
    /// Create an empty delta at the given tick.
    #[must_use]
    pub fn new(tick: u64, timestamp: f64) -> Self {
        Self {
            tick,
            timestamp,
            spawned: Vec::new(),
            destroyed: Vec::new(),
            modified: BTreeMap::new(),
        }
    }

    /// Whether this delta carries no changes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawned.is_empty() && self.destroyed.is_empty() && self.modified.is_empty()
    }
}
