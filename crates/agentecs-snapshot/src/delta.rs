//! Diffing and patching between world snapshots.

use crate::snapshot::{ComponentDiff, EntitySnapshot, TickDelta, WorldSnapshot};
use std::collections::{BTreeMap, HashMap};

/// Compute the component-level differences between two versions of the same
/// entity.
///
/// Components are matched by `type_short`. A component present in `new` but
/// not `old` is an addition; present in `old` but not `new` is a removal;
/// present in both with unequal `data` is a modification. Components equal
/// on both sides produce no diff entry. The result is sorted by
/// `component_type` for deterministic output.
#[must_use]
pub fn diff_entity(old: &EntitySnapshot, new: &EntitySnapshot) -> Vec<ComponentDiff> {
    let old_by_type: HashMap<&str, _> = old.components.iter().map(|c| (c.type_short.as_str(), c)).collect();
    let new_by_type: HashMap<&str, _> = new.components.iter().map(|c| (c.type_short.as_str(), c)).collect();

    let mut keys: Vec<&str> = old_by_type.keys().chain(new_by_type.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    let mut diffs = Vec::new();
    for key in keys {
        let old_component = old_by_type.get(key);
        let new_component = new_by_type.get(key);

        match (old_component, new_component) {
            (None, None) => unreachable!("key came from one of the two maps"),
            (Some(old_c), None) => diffs.push(ComponentDiff {
                component_type: key.to_string(),
                type_name: old_c.type_name.clone(),
                old_value: Some(old_c.data.clone()),
                new_value: None,
            }),
            (None, Some(new_c)) => diffs.push(ComponentDiff {
                component_type: key.to_string(),
                type_name: new_c.type_name.clone(),
                old_value: None,
                new_value: Some(new_c.data.clone()),
            }),
            (Some(old_c), Some(new_c)) => {
                if old_c.data != new_c.data {
                    diffs.push(ComponentDiff {
                        component_type: key.to_string(),
                        type_name: new_c.type_name.clone(),
                        old_value: Some(old_c.data.clone()),
                        new_value: Some(new_c.data.clone()),
                    });
                }
            }
        }
    }

    diffs
}

/// Compute the delta that transforms `old` into `new`.
///
/// `spawned` lists entities present only in `new` (in `new`'s order);
/// `destroyed` lists ids present only in `old` (in `old`'s order); `modified`
/// carries per-entity component diffs for ids present in both snapshots
/// where at least one component changed.
#[must_use]
pub fn diff(old: &WorldSnapshot, new: &WorldSnapshot) -> TickDelta {
    let old_by_id: HashMap<u64, &EntitySnapshot> = old.entities.iter().map(|e| (e.id.0, e)).collect();
    let new_by_id: HashMap<u64, &EntitySnapshot> = new.entities.iter().map(|e| (e.id.0, e)).collect();

    let destroyed: Vec<u64> = old
        .entities
        .iter()
        .map(|e| e.id.0)
        .filter(|id| !new_by_id.contains_key(id))
        .collect();

    let spawned: Vec<EntitySnapshot> = new
        .entities
        .iter()
        .filter(|e| !old_by_id.contains_key(&e.id.0))
        .cloned()
        .collect();

    let mut modified = BTreeMap::new();
    for (id, new_entity) in &new_by_id {
        if let Some(old_entity) = old_by_id.get(id) {
            let component_diffs = diff_entity(old_entity, new_entity);
            if !component_diffs.is_empty() {
                modified.insert(*id, component_diffs);
            }
        }
    }

    TickDelta {
        tick: new.tick,
        timestamp: new.timestamp,
        spawned,
        destroyed,
        modified,
    }
}

/// Apply a delta to a snapshot, producing the successor snapshot.
///
/// Destroyed entities are removed first, so a stale `modified` entry that
/// targets an entity also listed in `destroyed` is silently ignored: by the
/// time modifications are applied, that entity is no longer present to look
/// up. Spawned entities are appended after modifications are applied.
/// `metadata` is carried over unchanged from `snapshot`.
#[must_use]
pub fn apply(snapshot: &WorldSnapshot, delta: &TickDelta) -> WorldSnapshot {
    let destroyed: std::collections::HashSet<u64> = delta.destroyed.iter().copied().collect();

    let mut entities: Vec<EntitySnapshot> = snapshot
        .entities
        .iter()
        .filter(|e| !destroyed.contains(&e.id.0))
        .cloned()
        .collect();

    for entity in &mut entities {
        if let Some(diffs) = delta.modified.get(&entity.id.0) {
            apply_component_diffs(entity, diffs);
        }
    }

    entities.extend(delta.spawned.iter().cloned());

    WorldSnapshot {
        tick: delta.tick,
        timestamp: delta.timestamp,
        entities,
        metadata: snapshot.metadata.clone(),
    }
}

fn apply_component_diffs(entity: &mut EntitySnapshot, diffs: &[ComponentDiff]) {
    for d in diffs {
        match (&d.old_value, &d.new_value) {
            (None, Some(new_value)) => {
                entity.components.push(crate::snapshot::ComponentSnapshot {
                    type_name: d.type_name.clone(),
                    type_short: d.component_type.clone(),
                    data: new_value.clone(),
                });
            }
            (Some(_), None) => {
                entity.components.retain(|c| c.type_short != d.component_type);
            }
            (Some(_), Some(new_value)) => {
                if let Some(component) = entity
                    .components
                    .iter_mut()
                    .find(|c| c.type_short == d.component_type)
                {
                    component.data = new_value.clone();
                }
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ComponentSnapshot, EntityId};

    fn position(x: i64, y: i64) -> ComponentSnapshot {
        ComponentSnapshot {
            type_name: "agentecs.components.Position".to_string(),
            type_short: "Position".to_string(),
            data: serde_json::json!({"x": x, "y": y}),
        }
    }

    fn health(hp: i64) -> ComponentSnapshot {
        ComponentSnapshot {
            type_name: "agentecs.components.Health".to_string(),
            type_short: "Health".to_string(),
            data: serde_json::json!({"hp": hp}),
        }
    }

    #[test]
    fn diff_entity_no_change_is_empty() {
        let mut e1 = EntitySnapshot::new(EntityId(1));
        e1.components.push(position(1, 2));
        let e2 = e1.clone();

        assert!(diff_entity(&e1, &e2).is_empty());
    }

    #[test]
    fn diff_entity_detects_component_added() {
        let old = EntitySnapshot::new(EntityId(1));
        let mut new = old.clone();
        new.components.push(position(0, 0));

        let diffs = diff_entity(&old, &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].component_type, "Position");
        assert!(diffs[0].old_value.is_none());
        assert!(diffs[0].new_value.is_some());
    }

    #[test]
    fn diff_entity_detects_component_removed() {
        let mut old = EntitySnapshot::new(EntityId(1));
        old.components.push(position(0, 0));
        let new = EntitySnapshot::new(EntityId(1));

        let diffs = diff_entity(&old, &new);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].old_value.is_some());
        assert!(diffs[0].new_value.is_none());
    }

    #[test]
    fn diff_entity_detects_component_modified() {
        let mut old = EntitySnapshot::new(EntityId(1));
        old.components.push(position(0, 0));
        let mut new = EntitySnapshot::new(EntityId(1));
        new.components.push(position(1, 1));

        let diffs = diff_entity(&old, &new);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].old_value, Some(serde_json::json!({"x": 0, "y": 0})));
        assert_eq!(diffs[0].new_value, Some(serde_json::json!({"x": 1, "y": 1})));
    }

    #[test]
    fn diff_entity_type_name_resolved_from_present_side() {
        let old = EntitySnapshot::new(EntityId(1));
        let mut new = old.clone();
        new.components.push(health(10));

        let diffs = diff_entity(&old, &new);
        assert_eq!(diffs[0].type_name, "agentecs.components.Health");
    }

    #[test]
    fn diff_computes_spawned_and_destroyed() {
        let old = {
            let mut s = WorldSnapshot::new(0, 0.0);
            s.entities.push(EntitySnapshot::new(EntityId(1)));
            s
        };
        let new = {
            let mut s = WorldSnapshot::new(1, 1.0);
            s.entities.push(EntitySnapshot::new(EntityId(2)));
            s
        };

        let delta = diff(&old, &new);
        assert_eq!(delta.destroyed, vec![1]);
        assert_eq!(delta.spawned.len(), 1);
        assert_eq!(delta.spawned[0].id, EntityId(2));
        assert!(delta.modified.is_empty());
    }

    #[test]
    fn diff_computes_modified_for_shared_entities() {
        let old = {
            let mut s = WorldSnapshot::new(0, 0.0);
            let mut e = EntitySnapshot::new(EntityId(1));
            e.components.push(position(0, 0));
            s.entities.push(e);
            s
        };
        let new = {
            let mut s = WorldSnapshot::new(1, 1.0);
            let mut e = EntitySnapshot::new(EntityId(1));
            e.components.push(position(5, 5));
            s.entities.push(e);
            s
        };

        let delta = diff(&old, &new);
        assert!(delta.spawned.is_empty());
        assert!(delta.destroyed.is_empty());
        assert_eq!(delta.modified.len(), 1);
        assert_eq!(delta.modified[&1].len(), 1);
    }

    #[test]
    fn apply_spawns_entities() {
        let snapshot = WorldSnapshot::new(0, 0.0);
        let mut delta = TickDelta::new(1, 1.0);
        delta.spawned.push(EntitySnapshot::new(EntityId(1)));

        let result = apply(&snapshot, &delta);
        assert_eq!(result.entity_count(), 1);
        assert_eq!(result.tick, 1);
    }

    #[test]
    fn apply_destroys_entities() {
        let mut snapshot = WorldSnapshot::new(0, 0.0);
        snapshot.entities.push(EntitySnapshot::new(EntityId(1)));
        let mut delta = TickDelta::new(1, 1.0);
        delta.destroyed.push(1);

        let result = apply(&snapshot, &delta);
        assert_eq!(result.entity_count(), 0);
    }

    #[test]
    fn apply_modifies_components() {
        let mut snapshot = WorldSnapshot::new(0, 0.0);
        let mut entity = EntitySnapshot::new(EntityId(1));
        entity.components.push(position(0, 0));
        snapshot.entities.push(entity);

        let mut delta = TickDelta::new(1, 1.0);
        delta.modified.insert(
            1,
            vec![ComponentDiff {
                component_type: "Position".to_string(),
                type_name: "agentecs.components.Position".to_string(),
                old_value: Some(serde_json::json!({"x": 0, "y": 0})),
                new_value: Some(serde_json::json!({"x": 9, "y": 9})),
            }],
        );

        let result = apply(&snapshot, &delta);
        let updated = &result.entities[0];
        assert_eq!(updated.component("Position").unwrap().data, serde_json::json!({"x": 9, "y": 9}));
    }

    #[test]
    fn apply_ignores_modification_to_simultaneously_destroyed_entity() {
        let mut snapshot = WorldSnapshot::new(0, 0.0);
        let mut entity = EntitySnapshot::new(EntityId(1));
        entity.components.push(position(0, 0));
        snapshot.entities.push(entity);

        let mut delta = TickDelta::new(1, 1.0);
        delta.destroyed.push(1);
        delta.modified.insert(
            1,
            vec![ComponentDiff {
                component_type: "Position".to_string(),
                type_name: "agentecs.components.Position".to_string(),
                old_value: Some(serde_json::json!({"x": 0, "y": 0})),
                new_value: Some(serde_json::json!({"x": 9, "y": 9})),
            }],
        );

        let result = apply(&snapshot, &delta);
        assert_eq!(result.entity_count(), 0);
    }

    #[test]
    fn diff_then_apply_reconstructs_successor() {
        let old = {
            let mut s = WorldSnapshot::new(0, 0.0);
            let mut e1 = EntitySnapshot::new(EntityId(1));
            e1.components.push(position(0, 0));
            let mut e2 = EntitySnapshot::new(EntityId(2));
            e2.components.push(health(10));
            s.entities.push(e1);
            s.entities.push(e2);
            s
        };

        let new = {
            let mut s = WorldSnapshot::new(1, 1.0);
            let mut e1 = EntitySnapshot::new(EntityId(1));
            e1.components.push(position(3, 4));
            let mut e3 = EntitySnapshot::new(EntityId(3));
            e3.components.push(health(5));
            s.entities.push(e1);
            s.entities.push(e3);
            s
        };

        let delta = diff(&old, &new);
        let reconstructed = apply(&old, &delta);

        let mut expected_ids: Vec<u64> = new.entities.iter().map(|e| e.id.0).collect();
        let mut actual_ids: Vec<u64> = reconstructed.entities.iter().map(|e| e.id.0).collect();
        expected_ids.sort_unstable();
        actual_ids.sort_unstable();
        assert_eq!(actual_ids, expected_ids);

        let reconstructed_e1 = reconstructed.entities.iter().find(|e| e.id.0 == 1).unwrap();
        assert_eq!(
            reconstructed_e1.component("Position").unwrap().data,
            serde_json::json!({"x": 3, "y": 4})
        );
    }
}
