//! A per-tick event log. Systems append facts about what happened (a kill,
//! a level-up, a generator failure) instead of reaching for side channels;
//! the host drains the log after each tick and is free to fan it out to
//! logging, replication, or UI.

use seedfall_ecs::entity::EntityId;
use serde::{Deserialize, Serialize};

use crate::components::{DamageKind, StatusKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    EntityDied {
        entity: EntityId,
        killer: Option<EntityId>,
    },
    DamageDealt {
        source: EntityId,
        target: EntityId,
        amount: f32,
        kind: DamageKind,
        was_crit: bool,
    },
    StatusApplied {
        target: EntityId,
        kind: StatusKind,
    },
    StatusExpired {
        target: EntityId,
        kind: StatusKind,
    },
    LeveledUp {
        entity: EntityId,
        new_level: u32,
    },
    LayerTransitionStarted {
        entity: EntityId,
        from: u8,
        to: u8,
    },
    LayerTransitionCompleted {
        entity: EntityId,
        layer: u8,
    },
    PuzzleSolved {
        entity: EntityId,
    },
    GenerationFailed {
        context: String,
        reason: String,
    },
}

/// Append-only log for a single tick. Cleared by the host after drain; a
/// system that doesn't drain it will simply see events pile up across
/// ticks, which is a bug in the host, not in this type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
