//! Bounded checkpoint+delta history store.

use crate::events::{ErrorEvent, SpanEvent};
use agentecs_snapshot::{apply, diff, TickDelta, WorldSnapshot};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::trace;

/// One retained tick: either a full snapshot or a delta against its
/// predecessor.
#[derive(Debug, Clone)]
enum Entry {
    Checkpoint(WorldSnapshot),
    Delta(TickDelta),
}

struct Inner {
    entries: BTreeMap<u64, Entry>,
    checkpoint_ticks: Vec<u64>,
    last_snapshot: Option<WorldSnapshot>,
    errors: BTreeMap<u64, Vec<ErrorEvent>>,
    spans: BTreeMap<u64, Vec<SpanEvent>>,
}

impl Inner {
    fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            checkpoint_ticks: Vec::new(),
            last_snapshot: None,
            errors: BTreeMap::new(),
            spans: BTreeMap::new(),
        }
    }
}

/// A bounded, ordered time series of world snapshots.
///
/// Retains at most `max_ticks` ticks. Every `checkpoint_interval`-th tick
/// (plus the very first ever recorded) is stored as a full snapshot; all
/// other ticks are stored as a delta against the previously recorded
/// snapshot. Reconstructing a retained tick walks forward from the nearest
/// preceding checkpoint, found by binary search.
pub struct InMemoryHistoryStore {
    max_ticks: usize,
    checkpoint_interval: u64,
    inner: RwLock<Inner>,
}

impl InMemoryHistoryStore {
    /// Create a store with the given retention window and checkpoint
    /// cadence.
    #[must_use]
    pub fn new(max_ticks: usize, checkpoint_interval: u64) -> Self {
        Self {
            max_ticks,
            checkpoint_interval,
            inner: RwLock::new(Inner::new()),
        }
    }

    /// Record a snapshot. A no-op if `snapshot.tick` is already retained.
    pub fn record_tick(&self, snapshot: WorldSnapshot) {
        let mut inner = self.inner.write();
        let tick = snapshot.tick;

        if inner.entries.contains_key(&tick) {
            return;
        }

        let is_checkpoint = inner.entries.is_empty() || tick % self.checkpoint_interval.max(1) == 0;

        if is_checkpoint {
            inner.entries.insert(tick, Entry::Checkpoint(snapshot.clone()));
            insert_sorted(&mut inner.checkpoint_ticks, tick);
        } else {
            let predecessor = inner.last_snapshot.clone().unwrap_or_else(|| WorldSnapshot::new(0, 0.0));
            let delta = diff(&predecessor, &snapshot);
            inner.entries.insert(tick, Entry::Delta(delta));
        }

        inner.last_snapshot = Some(snapshot);
        self.evict_locked(&mut inner);
    }

    /// Reconstruct the snapshot retained at `tick`, or `None` if it is not
    /// (or no longer) retained.
    #[must_use]
    pub fn get_snapshot(&self, tick: u64) -> Option<WorldSnapshot> {
        let inner = self.inner.read();
        if !inner.entries.contains_key(&tick) {
            return None;
        }

        match inner.entries.get(&tick) {
            Some(Entry::Checkpoint(snapshot)) => Some(snapshot.clone()),
            Some(Entry::Delta(_)) => {
                let checkpoint_tick = floor_checkpoint(&inner.checkpoint_ticks, tick)?;
                let Some(Entry::Checkpoint(base)) = inner.entries.get(&checkpoint_tick) else {
                    return None;
                };
                let mut current = base.clone();
                for (_, entry) in inner.entries.range((checkpoint_tick + 1)..=tick) {
                    if let Entry::Delta(delta) = entry {
                        current = apply(&current, delta);
                    }
                }
                Some(current)
            }
            None => None,
        }
    }

    /// The oldest and newest retained ticks, or `None` if the store is
    /// empty.
    #[must_use]
    pub fn get_tick_range(&self) -> Option<(u64, u64)> {
        let inner = self.inner.read();
        let min = *inner.entries.keys().next()?;
        let max = *inner.entries.keys().next_back()?;
        Some((min, max))
    }

    /// All currently retained ticks, in ascending order.
    #[must_use]
    pub fn stored_ticks(&self) -> Vec<u64> {
        self.inner.read().entries.keys().copied().collect()
    }

    /// Whether `tick` is currently retained.
    #[must_use]
    pub fn contains_tick(&self, tick: u64) -> bool {
        self.inner.read().entries.contains_key(&tick)
    }

    /// Record an application-level error, indexed by its tick.
    pub fn record_error(&self, event: ErrorEvent) {
        let mut inner = self.inner.write();
        inner.errors.entry(event.tick).or_default().push(event);
    }

    /// Errors recorded at ticks in `[start, end]`, inclusive.
    #[must_use]
    pub fn get_errors(&self, start: u64, end: u64) -> Vec<ErrorEvent> {
        let inner = self.inner.read();
        inner.errors.range(start..=end).flat_map(|(_, events)| events.iter().cloned()).collect()
    }

    /// Errors recorded at ticks in `[start, end]` that concern `entity_id`.
    #[must_use]
    pub fn get_errors_for_entity(&self, entity_id: u64, start: u64, end: u64) -> Vec<ErrorEvent> {
        self.get_errors(start, end)
            .into_iter()
            .filter(|e| e.entity_id == Some(entity_id))
            .collect()
    }

    /// Record a tracing span. Indexed by the tick carried in its
    /// attributes; spans missing that attribute are recorded but not
    /// retrievable by tick range.
    pub fn record_span(&self, event: SpanEvent) {
        let mut inner = self.inner.write();
        match event.tick() {
            Some(tick) => {
                inner.spans.entry(tick).or_default().push(event);
            }
            None => {
                trace!(span_id = %event.span_id, "span has no tick attribute, not indexed");
            }
        }
    }

    /// Spans recorded at ticks in `[start, end]`, inclusive.
    #[must_use]
    pub fn get_spans(&self, start: u64, end: u64) -> Vec<SpanEvent> {
        let inner = self.inner.read();
        inner.spans.range(start..=end).flat_map(|(_, events)| events.iter().cloned()).collect()
    }

    /// Empty the store entirely: snapshots, deltas, errors, and spans.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        *inner = Inner::new();
    }

    /// Evict entries past `max_ticks`, promoting the new earliest entry to
    /// a checkpoint when necessary. Caller holds the write lock.
    fn evict_locked(&self, inner: &mut Inner) {
        while inner.entries.len() > self.max_ticks {
            let Some((&evicted_tick, _)) = inner.entries.iter().next() else {
                break;
            };
            let evicted = inner.entries.remove(&evicted_tick);
            if let Some(pos) = inner.checkpoint_ticks.iter().position(|&t| t == evicted_tick) {
                inner.checkpoint_ticks.remove(pos);
            }
            inner.errors.remove(&evicted_tick);
            inner.spans.remove(&evicted_tick);

            if let Some(Entry::Checkpoint(evicted_snapshot)) = evicted {
                let next_delta_tick = match inner.entries.iter().next() {
                    Some((&next_tick, Entry::Delta(_))) => Some(next_tick),
                    _ => None,
                };

                if let Some(next_tick) = next_delta_tick {
                    let Some(Entry::Delta(delta)) = inner.entries.remove(&next_tick) else {
                        unreachable!("checked above")
                    };
                    let promoted = apply(&evicted_snapshot, &delta);
                    inner.entries.insert(next_tick, Entry::Checkpoint(promoted));
                    insert_sorted(&mut inner.checkpoint_ticks, next_tick);
                }
            }
        }
    }
}

fn insert_sorted(ticks: &mut Vec<u64>, tick: u64) {
    let pos = ticks.partition_point(|&t| t < tick);
    ticks.insert(pos, tick);
}

/// The greatest value in `sorted` that is `<= tick`, via binary search.
fn floor_checkpoint(sorted: &[u64], tick: u64) -> Option<u64> {
    let idx = sorted.partition_point(|&t| t <= tick);
    if idx == 0 {
        None
    } else {
        Some(sorted[idx - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentecs_snapshot::{ComponentSnapshot, EntityId, EntitySnapshot};

    fn snapshot_with_position(tick: u64, entity_id: u64, x: i64) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new(tick, tick as f64);
        let mut entity = EntitySnapshot::new(EntityId(entity_id));
        entity.components.push(ComponentSnapshot {
            type_name: "agentecs.components.Position".to_string(),
            type_short: "Position".to_string(),
            data: serde_json::json!({"x": x}),
        });
        snapshot.entities.push(entity);
        snapshot
    }

    #[test]
    fn record_tick_is_idempotent() {
        let store = InMemoryHistoryStore::new(10, 5);
        store.record_tick(snapshot_with_position(0, 1, 0));
        store.record_tick(snapshot_with_position(0, 1, 999));

        let snapshot = store.get_snapshot(0).unwrap();
        assert_eq!(
            snapshot.entities[0].component("Position").unwrap().data,
            serde_json::json!({"x": 0})
        );
    }

    #[test]
    fn checkpoint_reconstruction_across_deltas() {
        let store = InMemoryHistoryStore::new(100, 5);
        for tick in 0..10u64 {
            store.record_tick(snapshot_with_position(tick, 1, (tick * 10) as i64));
        }

        for tick in 0..10u64 {
            let snapshot = store.get_snapshot(tick).unwrap();
            assert_eq!(
                snapshot.entities[0].component("Position").unwrap().data,
                serde_json::json!({"x": tick * 10})
            );
        }
    }

    #[test]
    fn unretained_tick_returns_none() {
        let store = InMemoryHistoryStore::new(100, 5);
        store.record_tick(snapshot_with_position(0, 1, 0));
        assert!(store.get_snapshot(99).is_none());
    }

    #[test]
    fn eviction_retains_latest_ticks() {
        let store = InMemoryHistoryStore::new(3, 5);
        for tick in 0..6u64 {
            store.record_tick(snapshot_with_position(tick, 1, tick as i64));
        }

        assert_eq!(store.get_tick_range(), Some((3, 5)));
        assert_eq!(store.stored_ticks(), vec![3, 4, 5]);
    }

    #[test]
    fn eviction_promotes_successor_to_checkpoint() {
        let store = InMemoryHistoryStore::new(3, 5);
        for tick in 0..4u64 {
            store.record_tick(snapshot_with_position(tick, 1, tick as i64));
        }

        assert_eq!(store.stored_ticks(), vec![1, 2, 3]);
        let snapshot = store.get_snapshot(1).unwrap();
        assert_eq!(
            snapshot.entities[0].component("Position").unwrap().data,
            serde_json::json!({"x": 1})
        );
    }

    #[test]
    fn eviction_clears_side_store_entries() {
        let store = InMemoryHistoryStore::new(2, 5);
        store.record_tick(snapshot_with_position(0, 1, 0));
        store.record_error(ErrorEvent {
            tick: 0,
            entity_id: Some(1),
            severity: crate::events::ErrorSeverity::Warning,
            message: "ouch".to_string(),
        });

        store.record_tick(snapshot_with_position(1, 1, 1));
        store.record_tick(snapshot_with_position(2, 1, 2));

        assert!(store.get_errors(0, 0).is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let store = InMemoryHistoryStore::new(10, 5);
        store.record_tick(snapshot_with_position(0, 1, 0));
        store.clear();

        assert!(store.get_tick_range().is_none());
        assert!(store.get_snapshot(0).is_none());
    }

    #[test]
    fn tick_range_for_nonempty_store() {
        let store = InMemoryHistoryStore::new(10, 5);
        for tick in 0..4u64 {
            store.record_tick(snapshot_with_position(tick, 1, 0));
        }
        assert_eq!(store.get_tick_range(), Some((0, 3)));
    }

    #[test]
    fn errors_and_spans_range_queries_are_inclusive() {
        let store = InMemoryHistoryStore::new(10, 5);
        for tick in 0..5u64 {
            store.record_error(ErrorEvent {
                tick,
                entity_id: None,
                severity: crate::events::ErrorSeverity::Info,
                message: format!("tick {tick}"),
            });
        }

        let errors = store.get_errors(1, 3);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].tick, 1);
        assert_eq!(errors[2].tick, 3);
    }

    #[test]
    fn get_errors_for_entity_filters_by_id() {
        let store = InMemoryHistoryStore::new(10, 5);
        store.record_error(ErrorEvent {
            tick: 0,
            entity_id: Some(1),
            severity: crate::events::ErrorSeverity::Critical,
            message: "a".to_string(),
        });
        store.record_error(ErrorEvent {
            tick: 0,
            entity_id: Some(2),
            severity: crate::events::ErrorSeverity::Critical,
            message: "b".to_string(),
        });

        let errors = store.get_errors_for_entity(1, 0, 0);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "a");
    }
}
