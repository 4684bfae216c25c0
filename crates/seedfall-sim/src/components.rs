//! The component vocabulary: plain data records with no behavior. Systems
//! interpret them; nothing here owns logic beyond small accessor helpers.

use std::collections::HashMap;

use seedfall_ecs::entity::EntityId;
use serde::{Deserialize, Serialize};

pub use seedfall_procgen::content::{ContentId, DamageKind};

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub layer: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aim {
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facing {
    pub last: Direction,
}

/// Derive a facing direction from a velocity, per the movement system's
/// rule: the dominant axis wins; ties (both near zero) return `None` so the
/// caller retains the previous facing.
pub fn facing_from_velocity(vx: f32, vy: f32) -> Option<Direction> {
    const EPSILON: f32 = 1e-4;
    if vx.abs() < EPSILON && vy.abs() < EPSILON {
        return None;
    }
    Some(if vx.abs() > vy.abs() {
        if vx > 0.0 { Direction::Right } else { Direction::Left }
    } else if vy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    })
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    pub amount: f32,
    pub max_amount: f32,
    pub duration: f32,
    pub max_duration: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack: f32,
    pub defense: f32,
    pub crit_chance: f32,
    pub crit_damage: f32,
    pub resistances: HashMap<DamageKind, f32>,
    pub cooldown: f32,
    pub cooldown_timer: f32,
    /// The element a basic attack carries, driving which on-hit effect (if
    /// any) procs per the elemental proc table.
    pub damage_kind: DamageKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u32,
}

/// Marker: entity has died. `Health.current == 0` must imply `Dead` is
/// present on the entity by the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dead;

/// Marker: entity is frozen (blocks movement). Duration is tracked by the
/// associated `StatusEffect { kind: Frozen, .. }`; this marker is attached
/// and detached by the status effect system, not carried here, so the two
/// never disagree about whether the entity is currently frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frozen;

// ---------------------------------------------------------------------------
// Status effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Burning,
    Poisoned,
    Frozen,
    Strength,
    Weakness,
    Fortify,
    Vulnerability,
}

/// A single active status effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub duration: f32,
    pub magnitude: f32,
    pub tick_interval: f32,
    pub next_tick: f32,
}

/// A fixed-capacity pool of active status effects on one entity. Slots are
/// acquired and released in place (see [`crate::systems::status`]) instead
/// of growing and shrinking a `Vec`, so a busy entity under sustained DoTs
/// doesn't churn allocations every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub slots: Vec<Option<StatusEffect>>,
}

impl StatusEffects {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: vec![None; capacity] }
    }
}

// ---------------------------------------------------------------------------
// Items & progression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub slots: Vec<Option<ContentId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    MainHand,
    OffHand,
    Head,
    Body,
    Feet,
    Accessory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub by_slot: HashMap<EquipSlot, ContentId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub level: u32,
    pub xp: u64,
}

/// Spells known by an entity, plus the shared cast cooldown and which
/// known spell fires on the next cast. Entity-owned rather than looked up
/// from a global registry, the same way `Inventory`/`Equipment` carry their
/// content directly rather than through an indirection table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellBook {
    pub spells: Vec<seedfall_procgen::content::SpellDef>,
    pub active: usize,
    pub cooldown_timer: f32,
}

// ---------------------------------------------------------------------------
// Collision & layers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub w: f32,
    pub h: f32,
    pub solid: bool,
}

/// Wraps a generated terrain grid so it can be attached to a singleton
/// "world" entity and looked up by the collision system through the usual
/// query path, rather than threaded through every system call as an extra
/// parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainGrid {
    pub map: seedfall_procgen::terrain::TerrainMap,
}

/// An entity lacking this component defaults to layer 0 (ground) for
/// collision purposes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerComp {
    pub current: u8,
    /// -1 means "not transitioning".
    pub target: i8,
    pub transition_progress: f32,
    pub can_fly: bool,
    pub can_swim: bool,
    pub can_climb: bool,
}

impl Default for LayerComp {
    fn default() -> Self {
        Self {
            current: 0,
            target: -1,
            transition_progress: 0.0,
            can_fly: false,
            can_swim: false,
            can_climb: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimStateKind {
    Idle,
    Walk,
    Run,
    Attack,
    Hit,
    Cast,
    Death,
}

impl AnimStateKind {
    /// Whether this state is an atomic, non-interruptible action state.
    /// Movement-driven transitions (idle/walk/run) must not override these;
    /// only the state's own completion (`onComplete`) exits them.
    pub fn is_action_state(self) -> bool {
        matches!(self, AnimStateKind::Attack | AnimStateKind::Hit | AnimStateKind::Cast)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimState {
    pub state: AnimStateKind,
    pub frame_idx: u32,
    pub frame_time: f32,
    pub loop_anim: bool,
    pub dirty: bool,
    pub last_facing: Direction,
    pub on_complete: Option<AnimStateKind>,
}

impl Default for AnimState {
    fn default() -> Self {
        Self {
            state: AnimStateKind::Idle,
            frame_idx: 0,
            frame_time: 0.0,
            loop_anim: true,
            dirty: false,
            last_facing: Direction::Down,
            on_complete: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Input & networking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub move_x: f32,
    pub move_y: f32,
    pub aim_angle: f32,
    pub action_bits: u32,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Networked {
    pub last_sent_hash: u64,
    pub interest_score: f32,
}

// ---------------------------------------------------------------------------
// AI & puzzles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    pub behavior_tag: String,
    pub target: Option<EntityId>,
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuzzleRuntimeState {
    Unsolved,
    Solved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    pub kind: seedfall_procgen::puzzle::PuzzleKind,
    pub elements: Vec<u32>,
    /// The witness sequence generated alongside this puzzle; the runtime
    /// check compares `solved_order` against this, never the other way
    /// around.
    pub witness: Vec<usize>,
    pub solved_order: Vec<usize>,
    pub state: PuzzleRuntimeState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_from_velocity_prefers_dominant_axis() {
        assert_eq!(facing_from_velocity(5.0, 1.0), Some(Direction::Right));
        assert_eq!(facing_from_velocity(-5.0, 1.0), Some(Direction::Left));
        assert_eq!(facing_from_velocity(1.0, 5.0), Some(Direction::Down));
        assert_eq!(facing_from_velocity(1.0, -5.0), Some(Direction::Up));
    }

    #[test]
    fn facing_from_velocity_below_epsilon_is_none() {
        assert_eq!(facing_from_velocity(0.0, 0.0), None);
        assert_eq!(facing_from_velocity(1e-6, -1e-6), None);
    }
}
