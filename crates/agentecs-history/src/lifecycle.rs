//! Read-only report of when each entity first and last appeared across the
//! ticks currently retained by a history store.

use crate::store::InMemoryHistoryStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The span of retained ticks over which an entity was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLifecycle {
    /// First retained tick at which the entity was present.
    pub spawn_tick: u64,
    /// First retained tick at which the entity was no longer present, or
    /// `None` if it was still present at the last retained tick.
    pub despawn_tick: Option<u64>,
}

/// Compute a lifecycle report for every entity observed in the ticks
/// currently retained by `store`.
///
/// Iterates the store's retained ticks in ascending order rather than an
/// integer range, so gaps left by eviction do not produce spurious
/// spawn/despawn boundaries: an entity present at every retained tick gets
/// one contiguous lifecycle even if ticks between them were evicted.
#[must_use]
pub fn compute_entity_lifecycles(store: &InMemoryHistoryStore) -> BTreeMap<u64, EntityLifecycle> {
    let mut lifecycles = BTreeMap::new();
    let mut previous_ids: BTreeSet<u64> = BTreeSet::new();

    for tick in store.stored_ticks() {
        let Some(snapshot) = store.get_snapshot(tick) else {
            continue;
        };
        let current_ids: BTreeSet<u64> = snapshot.entities.iter().map(|e| e.id.0).collect();

        for &id in &current_ids {
            if !previous_ids.contains(&id) {
                lifecycles.insert(
                    id,
                    EntityLifecycle {
                        spawn_tick: tick,
                        despawn_tick: None,
                    },
                );
            }
        }

        for &id in &previous_ids {
            if !current_ids.contains(&id) {
                if let Some(lifecycle) = lifecycles.get_mut(&id) {
                    lifecycle.despawn_tick = Some(tick);
                }
            }
        }

        previous_ids = current_ids;
    }

    lifecycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentecs_snapshot::{EntityId, EntitySnapshot, WorldSnapshot};

    fn snapshot_with_entities(tick: u64, ids: &[u64]) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new(tick, tick as f64);
        for &id in ids {
            snapshot.entities.push(EntitySnapshot::new(EntityId(id)));
        }
        snapshot
    }

    #[test]
    fn entity_present_throughout_has_no_despawn() {
        let store = InMemoryHistoryStore::new(100, 5);
        for tick in 0..3u64 {
            store.record_tick(snapshot_with_entities(tick, &[1]));
        }

        let lifecycles = compute_entity_lifecycles(&store);
        assert_eq!(lifecycles[&1].spawn_tick, 0);
        assert_eq!(lifecycles[&1].despawn_tick, None);
    }

    #[test]
    fn entity_despawn_recorded_at_first_absence() {
        let store = InMemoryHistoryStore::new(100, 5);
        store.record_tick(snapshot_with_entities(0, &[1]));
        store.record_tick(snapshot_with_entities(1, &[1]));
        store.record_tick(snapshot_with_entities(2, &[]));

        let lifecycles = compute_entity_lifecycles(&store);
        assert_eq!(lifecycles[&1].despawn_tick, Some(2));
    }

    #[test]
    fn non_sequential_retained_ticks_still_produce_one_lifecycle() {
        let store = InMemoryHistoryStore::new(3, 5);
        for tick in 0..6u64 {
            store.record_tick(snapshot_with_entities(tick, &[1]));
        }

        let lifecycles = compute_entity_lifecycles(&store);
        let (min, _) = store.get_tick_range().unwrap();
        assert_eq!(lifecycles[&1].spawn_tick, min);
        assert_eq!(lifecycles[&1].despawn_tick, None);
    }
}
