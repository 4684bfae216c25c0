//! Wire types exchanged between client and server, plus the bincode codec
//! used to (de)serialize them. Both sides speak the same length-prefixed
//! framing; fields are tagged via serde's default struct encoding so an
//! older client skips tags it doesn't know about (bincode's `serde`
//! integration round-trips any serde-compatible type without hand-writing
//! an `Encode`/`Decode` impl).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode wire message: {0}")]
    Encode(String),
    #[error("failed to decode wire message: {0}")]
    Decode(String),
}

/// Client -> server per-tick input record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub client_id: u32,
    pub seq: u64,
    pub move_x: f32,
    pub move_y: f32,
    pub aim_angle: f32,
    pub action_bits: u32,
}

impl Intent {
    /// Clamp `move_x`/`move_y` to `[-1, 1]` and `aim_angle` to `[0, 2*PI)`,
    /// per the external interface contract. Out-of-bounds intents are
    /// clamped, never rejected outright.
    pub fn clamped(mut self) -> Self {
        self.move_x = self.move_x.clamp(-1.0, 1.0);
        self.move_y = self.move_y.clamp(-1.0, 1.0);
        let tau = std::f32::consts::TAU;
        self.aim_angle = self.aim_angle.rem_euclid(tau);
        self
    }
}

/// One entity's changed component fields in a delta snapshot. Component
/// values travel as JSON so the wire format doesn't need a new variant
/// per component type (the same scheme the command buffer uses).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDelta {
    pub entity_id: u64,
    pub components: Vec<(String, serde_json::Value)>,
}

/// Server -> client per-tick state broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub server_tick: u64,
    pub ack_seq: u64,
    pub full_resync: bool,
    pub entities: Vec<EntityDelta>,
    /// The receiving client's own entity, so it knows which delta (if any)
    /// in `entities` to reconcile local prediction against.
    pub owned_entity: Option<u64>,
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| WireError::Encode(e.to_string()))
}

pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, WireError> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _consumed)| value)
        .map_err(|e| WireError::Decode(e.to_string()))
}
