//! Server-side lag compensation: a ring of recent position snapshots,
//! indexed by server tick, used to resolve a hit against the world as the
//! shooting client actually saw it rather than as it exists "now".

use std::collections::HashMap;

use seedfall_ecs::entity::EntityId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LagCompError {
    #[error("requested view time predates the compensation window")]
    StaleIntent,
    #[error("target entity not present in the reconstructed snapshot")]
    TargetNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPos {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
struct Frame {
    tick: u64,
    time_ms: f64,
    positions: HashMap<EntityId, EntityPos>,
}

/// Ring buffer of recent world snapshots, retained for `window_ms`. Holds
/// at minimum `window_ms / dt_ms` frames per the sizing rule.
pub struct SnapshotRing {
    window_ms: f64,
    dt_ms: f64,
    frames: Vec<Frame>,
}

impl SnapshotRing {
    pub fn new(window_ms: f64, dt_ms: f64) -> Self {
        Self { window_ms, dt_ms, frames: Vec::new() }
    }

    /// Record the current tick's entity positions and evict frames older
    /// than the window.
    pub fn push(&mut self, tick: u64, time_ms: f64, positions: HashMap<EntityId, EntityPos>) {
        self.frames.push(Frame { tick, time_ms, positions });
        let cutoff = time_ms - self.window_ms;
        self.frames.retain(|f| f.time_ms >= cutoff);
    }

    pub fn min_capacity(&self) -> usize {
        (self.window_ms / self.dt_ms).ceil() as usize
    }

    /// Reconstruct entity positions at `view_time_ms` by linear
    /// interpolation between the two bracketing frames. Rejects as
    /// [`LagCompError::StaleIntent`] if `view_time_ms` predates every
    /// retained frame.
    fn reconstruct(&self, view_time_ms: f64) -> Result<HashMap<EntityId, EntityPos>, LagCompError> {
        if self.frames.is_empty() {
            return Err(LagCompError::StaleIntent);
        }
        let earliest = self.frames.first().unwrap().time_ms;
        if view_time_ms < earliest {
            return Err(LagCompError::StaleIntent);
        }

        let mut before = None;
        let mut after = None;
        for frame in &self.frames {
            if frame.time_ms <= view_time_ms {
                before = Some(frame);
            } else if after.is_none() {
                after = Some(frame);
                break;
            }
        }

        let before = match before {
            Some(f) => f,
            None => return Ok(self.frames.first().unwrap().positions.clone()),
        };
        let Some(after) = after else {
            return Ok(before.positions.clone());
        };

        let span = after.time_ms - before.time_ms;
        let t = if span <= 0.0 { 0.0 } else { ((view_time_ms - before.time_ms) / span) as f32 };

        let mut out = HashMap::new();
        for (entity, before_pos) in &before.positions {
            let pos = match after.positions.get(entity) {
                Some(after_pos) => EntityPos {
                    x: before_pos.x + (after_pos.x - before_pos.x) * t,
                    y: before_pos.y + (after_pos.y - before_pos.y) * t,
                },
                None => *before_pos,
            };
            out.insert(*entity, pos);
        }
        Ok(out)
    }

    /// Estimate the client's view time: `now - rtt/2 - interp_delay`.
    pub fn estimate_view_time(now_ms: f64, rtt_ms: f64, interp_delay_ms: f64) -> f64 {
        now_ms - rtt_ms / 2.0 - interp_delay_ms
    }
}

/// Resolve whether `attacker` hits `target` at the reconstructed view time,
/// using a simple point-in-radius check (the actual weapon-range/aim-cone
/// test lives in `seedfall_sim::systems::combat`; this only rewinds
/// position history).
pub fn resolve_hit(
    ring: &SnapshotRing,
    view_time_ms: f64,
    attacker: EntityId,
    target: EntityId,
    hit_radius: f32,
) -> Result<bool, LagCompError> {
    let reconstructed = ring.reconstruct(view_time_ms)?;
    let attacker_pos = reconstructed.get(&attacker).ok_or(LagCompError::TargetNotFound)?;
    let target_pos = reconstructed.get(&target).ok_or(LagCompError::TargetNotFound)?;
    let dist = ((attacker_pos.x - target_pos.x).powi(2) + (attacker_pos.y - target_pos.y).powi(2)).sqrt();
    Ok(dist <= hit_radius)
}
