//! Save/load: a versioned on-disk envelope wrapping an [`EngineSnapshot`]
//! plus the root seed the run was generated from.
//!
//! The envelope is deliberately thin -- `magic` + `version` + payload --
//! so that loading an incompatible save fails fast with
//! [`SaveError::IncompatibleVersion`] instead of a confusing deserialize
//! panic deep in world restore.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::TickLoop;
use crate::snapshot::EngineSnapshot;

const MAGIC: &str = "SDFL";
const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("not a seedfall save file (bad magic: expected {MAGIC:?})")]
    BadMagic,
    #[error("save file version {found} is incompatible with current version {CURRENT_VERSION}")]
    IncompatibleVersion { found: u32 },
    #[error("failed to (de)serialize save envelope: {0}")]
    Codec(String),
    #[error("failed to restore world state: {0}")]
    Restore(String),
}

/// The on-disk save format. `magic`/`version` are checked before anything
/// else is touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub magic: String,
    pub version: u32,
    pub root_seed: u64,
    pub world_tick: u64,
    pub snapshot: EngineSnapshot,
}

/// Serialize `tick_loop`'s current state into a save envelope tagged with
/// `root_seed` (the seed the run was generated from, not reconstructible
/// from the snapshot alone since procgen inputs aren't part of ECS state).
pub fn save(tick_loop: &TickLoop, root_seed: u64) -> SaveEnvelope {
    let snapshot = tick_loop.capture_snapshot();
    SaveEnvelope {
        magic: MAGIC.to_owned(),
        version: CURRENT_VERSION,
        root_seed,
        world_tick: tick_loop.tick_count(),
        snapshot,
    }
}

/// Serialize an envelope to a JSON byte vector.
pub fn to_bytes(envelope: &SaveEnvelope) -> Result<Vec<u8>, SaveError> {
    serde_json::to_vec(envelope).map_err(|e| SaveError::Codec(e.to_string()))
}

/// Parse a JSON byte vector into an envelope, checking magic and version
/// before returning.
pub fn from_bytes(bytes: &[u8]) -> Result<SaveEnvelope, SaveError> {
    let envelope: SaveEnvelope =
        serde_json::from_slice(bytes).map_err(|e| SaveError::Codec(e.to_string()))?;
    if envelope.magic != MAGIC {
        return Err(SaveError::BadMagic);
    }
    if envelope.version != CURRENT_VERSION {
        return Err(SaveError::IncompatibleVersion { found: envelope.version });
    }
    Ok(envelope)
}

/// Restore `tick_loop` in place from a previously-loaded envelope. Returns
/// the envelope's `root_seed` so the caller can re-derive anything the
/// procgen layer needs that lives outside ECS state.
pub fn load(tick_loop: &mut TickLoop, envelope: &SaveEnvelope) -> Result<u64, SaveError> {
    tick_loop
        .restore_from_snapshot(&envelope.snapshot)
        .map_err(|e| SaveError::Restore(e.to_string()))?;
    Ok(envelope.root_seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TickConfig;
    use seedfall_ecs::world::World;

    fn fresh_loop() -> TickLoop {
        let world = World::new();
        let config = TickConfig { fixed_dt: 1.0 / 60.0, ..Default::default() };
        TickLoop::new(world, config)
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut tick_loop = fresh_loop();
        tick_loop.run_ticks(5);
        let envelope = save(&tick_loop, 42);
        let bytes = to_bytes(&envelope).unwrap();
        let restored = from_bytes(&bytes).unwrap();
        assert_eq!(restored.root_seed, 42);
        assert_eq!(restored.world_tick, 5);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut tick_loop = fresh_loop();
        let mut envelope = save(&tick_loop, 1);
        envelope.magic = "NOPE".to_owned();
        let bytes = to_bytes(&envelope).unwrap();
        assert!(matches!(from_bytes(&bytes), Err(SaveError::BadMagic)));
        let _ = tick_loop.run_ticks(0);
    }

    #[test]
    fn rejects_future_version() {
        let tick_loop = fresh_loop();
        let mut envelope = save(&tick_loop, 1);
        envelope.version = CURRENT_VERSION + 1;
        let bytes = to_bytes(&envelope).unwrap();
        assert!(matches!(
            from_bytes(&bytes),
            Err(SaveError::IncompatibleVersion { found }) if found == CURRENT_VERSION + 1
        ));
    }

    #[test]
    fn load_restores_tick_counter() {
        let mut tick_loop = fresh_loop();
        tick_loop.run_ticks(20);
        let envelope = save(&tick_loop, 7);
        tick_loop.run_ticks(20);
        assert_eq!(tick_loop.tick_count(), 40);
        load(&mut tick_loop, &envelope).unwrap();
        assert_eq!(tick_loop.tick_count(), 20);
    }
}
