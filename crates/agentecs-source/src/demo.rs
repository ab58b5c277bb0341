//! A small, self-contained world generator for tests and local exploration.
//!
//! This is deliberately minimal: a fixed number of entities orbiting a
//! center point, plus a low-probability synthetic error and span per tick.
//! It exists so the rest of the crate has something concrete to drive
//! without depending on a real ECS engine; it is not a model of one.

use crate::generator::WorldGenerator;
use agentecs_history::{ErrorEvent, ErrorSeverity, SpanEvent, SpanStatus, ENTITY_ATTRIBUTE, TICK_ATTRIBUTE};
use agentecs_snapshot::{ComponentSnapshot, EntitySnapshot, WorldSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Map;

/// Generates a small synthetic world: `entity_count` entities moving in
/// circles, with occasional synthetic error and span telemetry.
pub struct DemoWorldGenerator {
    entity_count: u64,
    rng: StdRng,
}

impl DemoWorldGenerator {
    /// Create a generator for `entity_count` entities, seeded for
    /// reproducibility.
    #[must_use]
    pub fn new(entity_count: u64) -> Self {
        Self {
            entity_count,
            rng: StdRng::seed_from_u64(0xAEC5),
        }
    }
}

impl WorldGenerator for DemoWorldGenerator {
    fn advance(&mut self, tick: u64, timestamp: f64) -> WorldSnapshot {
        let mut snapshot = WorldSnapshot::new(tick, timestamp);

        for id in 0..self.entity_count {
            let angle = (tick as f64 / 10.0) + (id as f64 * std::f64::consts::TAU / self.entity_count.max(1) as f64);
            let mut entity = EntitySnapshot::new(agentecs_snapshot::EntityId(id));
            entity.components.push(ComponentSnapshot {
                type_name: "agentecs.demo.Position".to_string(),
                type_short: "Position".to_string(),
                data: serde_json::json!({"x": angle.cos() * 10.0, "y": angle.sin() * 10.0}),
            });
            entity.components.push(ComponentSnapshot {
                type_name: "agentecs.demo.Health".to_string(),
                type_short: "Health".to_string(),
                data: serde_json::json!({"hp": 100 - (tick % 100)}),
            });
            snapshot.entities.push(entity);
        }

        snapshot
    }

    fn ancillary_events(&mut self, tick: u64) -> (Vec<ErrorEvent>, Vec<SpanEvent>) {
        let mut errors = Vec::new();
        let mut spans = Vec::new();

        if self.rng.random_bool(0.02) {
            errors.push(ErrorEvent {
                tick,
                entity_id: Some(tick % self.entity_count.max(1)),
                severity: ErrorSeverity::Warning,
                message: "synthetic demo error".to_string(),
            });
        }

        if self.rng.random_bool(0.1) {
            let mut attributes = Map::new();
            attributes.insert(TICK_ATTRIBUTE.to_string(), serde_json::json!(tick));
            attributes.insert(ENTITY_ATTRIBUTE.to_string(), serde_json::json!(tick % self.entity_count.max(1)));
            spans.push(SpanEvent {
                span_id: format!("demo-{tick}"),
                trace_id: "demo-trace".to_string(),
                parent_span_id: None,
                name: "demo.tick".to_string(),
                start_time: tick as f64,
                end_time: tick as f64 + 0.01,
                status: SpanStatus::Ok,
                attributes,
            });
        }

        (errors, spans)
    }

    fn visualization_config(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "world_name": "AgentECS Demo World",
            "archetypes": {
                "Position": {"label": "Position", "color": "#4f8ef7"},
                "Health": {"label": "Health", "color": "#e4584c"},
            },
            "entity_label_template": "entity-{id}",
        }))
    }
}
