//! Client-side prediction and reconciliation: an input ring keyed by
//! sequence number, a predicted local position, and [`reconcile`] which
//! snaps to an authoritative position and deterministically replays every
//! un-acked input on top of it.
//!
//! Remote (non-local) entities are never predicted here -- they're
//! interpolated between bracketing received snapshots by the caller, which
//! is why this module only exposes a local-prediction surface.

use serde::{Deserialize, Serialize};

use crate::wire::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictedState {
    pub x: f32,
    pub y: f32,
}

/// Ring of unacknowledged inputs, oldest first.
#[derive(Debug, Default)]
pub struct InputRing {
    pending: Vec<Intent>,
}

impl InputRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, intent: Intent) {
        self.pending.push(intent);
    }

    pub fn pending(&self) -> &[Intent] {
        &self.pending
    }

    /// Drop every input with `seq <= acked_seq`.
    pub fn acknowledge(&mut self, acked_seq: u64) {
        self.pending.retain(|i| i.seq > acked_seq);
    }
}

/// Integrate one intent into a predicted position. Movement speed is a
/// fixed per-tick unit, matching the simulation's own velocity integration
/// so replay on the client lands on the same position the server would
/// compute for the same input stream.
pub fn apply_intent(state: PredictedState, intent: &Intent, speed_per_tick: f32) -> PredictedState {
    PredictedState {
        x: state.x + intent.move_x * speed_per_tick,
        y: state.y + intent.move_y * speed_per_tick,
    }
}

/// Snap to `server_state` (the authoritative position as of `acked_seq`),
/// discard acknowledged inputs, then replay everything still pending in
/// sequence order. Two clients with identical pending inputs and the same
/// acked baseline always converge to the same result.
pub fn reconcile(
    ring: &mut InputRing,
    server_state: PredictedState,
    acked_seq: u64,
    speed_per_tick: f32,
) -> PredictedState {
    ring.acknowledge(acked_seq);
    let mut state = server_state;
    for intent in ring.pending() {
        state = apply_intent(state, intent, speed_per_tick);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(seq: u64, move_x: f32) -> Intent {
        Intent { client_id: 1, seq, move_x, move_y: 0.0, aim_angle: 0.0, action_bits: 0 }
    }

    #[test]
    fn acknowledge_drops_up_to_and_including_acked_seq() {
        let mut ring = InputRing::new();
        ring.push(intent(1, 1.0));
        ring.push(intent(2, 1.0));
        ring.push(intent(3, 1.0));
        ring.acknowledge(2);
        assert_eq!(ring.pending().len(), 1);
        assert_eq!(ring.pending()[0].seq, 3);
    }

    #[test]
    fn reconcile_replays_unacked_inputs_on_server_baseline() {
        let mut ring = InputRing::new();
        ring.push(intent(1, 1.0));
        ring.push(intent(2, 1.0));
        ring.push(intent(3, 1.0));

        let server_state = PredictedState { x: 0.0, y: 0.0 };
        let result = reconcile(&mut ring, server_state, 1, 2.0);

        // Only seq 2 and 3 replay (seq 1 was acked), each moving +2.0.
        assert_eq!(result.x, 4.0);
    }

    #[test]
    fn two_clients_with_identical_inputs_converge() {
        let mut ring_a = InputRing::new();
        let mut ring_b = InputRing::new();
        for seq in 1..=5 {
            ring_a.push(intent(seq, 0.5));
            ring_b.push(intent(seq, 0.5));
        }
        let baseline = PredictedState { x: 10.0, y: 10.0 };
        let result_a = reconcile(&mut ring_a, baseline, 2, 1.0);
        let result_b = reconcile(&mut ring_b, baseline, 2, 1.0);
        assert_eq!(result_a, result_b);
    }
}
