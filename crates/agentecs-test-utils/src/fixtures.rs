//! Snapshot builders for tests across the workspace.

use agentecs_snapshot::{ComponentSnapshot, EntityId, EntitySnapshot, WorldSnapshot};

/// Build an entity with the given id and components, specified as
/// `(type_short, data)` pairs. `type_name` defaults to `test.<type_short>`,
/// which is enough to disambiguate components in tests without spelling out
/// a fully-qualified name each time.
#[must_use]
pub fn make_entity(id: u64, components: &[(&str, serde_json::Value)]) -> EntitySnapshot {
    let mut entity = EntitySnapshot::new(EntityId(id));
    for (type_short, data) in components {
        entity.components.push(ComponentSnapshot {
            type_name: format!("test.{type_short}"),
            type_short: (*type_short).to_string(),
            data: data.clone(),
        });
    }
    entity
}

/// Build a world snapshot at `tick` containing `entities`.
#[must_use]
pub fn make_snapshot(tick: u64, entities: Vec<EntitySnapshot>) -> WorldSnapshot {
    let mut snapshot = WorldSnapshot::new(tick, tick as f64);
    snapshot.entities = entities;
    snapshot
}
