//! Interest management and delta replication: decide which entities a
//! client cares about, then serialize only the component fields that
//! changed since that client's last-sent baseline.

use std::collections::HashMap;

use seedfall_ecs::entity::EntityId;

use crate::wire::EntityDelta;

/// Per-client baseline: the last hash sent for each entity's component set,
/// so the next tick only re-sends what changed.
#[derive(Debug, Default)]
pub struct ClientBaseline {
    last_sent_hash: HashMap<EntityId, u64>,
}

impl ClientBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every entity to be treated as changed on the next build --
    /// used when a client requests a full resync.
    pub fn reset(&mut self) {
        self.last_sent_hash.clear();
    }
}

/// Computed per-client, per-entity interest score (distance/LOS/team
/// weighted). Entities scoring below [`InterestTable::threshold`] are
/// dropped from that client's replication set entirely.
pub struct InterestTable {
    threshold: f32,
}

impl InterestTable {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Simple distance-based score: `1 / (1 + distance)`, zero for
    /// different teams when `same_team_only` gameplay rules apply (left to
    /// the caller; this function only scores raw proximity).
    pub fn score(&self, dx: f32, dy: f32) -> f32 {
        let distance = (dx * dx + dy * dy).sqrt();
        1.0 / (1.0 + distance)
    }

    pub fn is_interesting(&self, score: f32) -> bool {
        score >= self.threshold
    }
}

/// One entity's current component set for delta purposes: name -> JSON
/// value, plus a content hash the caller computes once per entity.
pub struct EntityState {
    pub entity_id: EntityId,
    pub hash: u64,
    pub components: Vec<(String, serde_json::Value)>,
}

/// Build the delta snapshot for one client: entities above the interest
/// threshold whose hash differs from that client's baseline. Updates the
/// baseline in place.
pub fn build_delta_snapshot(
    baseline: &mut ClientBaseline,
    table: &InterestTable,
    viewer_pos: (f32, f32),
    entities: &[(EntityState, (f32, f32))],
) -> Vec<EntityDelta> {
    let mut deltas = Vec::new();
    for (state, pos) in entities {
        let score = table.score(pos.0 - viewer_pos.0, pos.1 - viewer_pos.1);
        if !table.is_interesting(score) {
            continue;
        }
        let changed = baseline.last_sent_hash.get(&state.entity_id) != Some(&state.hash);
        if !changed {
            continue;
        }
        baseline.last_sent_hash.insert(state.entity_id, state.hash);
        deltas.push(EntityDelta {
            entity_id: state.entity_id.to_raw(),
            components: state.components.clone(),
        });
    }
    deltas
}
