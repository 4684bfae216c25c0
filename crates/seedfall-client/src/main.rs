//! Predictive client shell: samples local intent, predicts the local
//! player's position ahead of server acknowledgement, reconciles on every
//! snapshot, and interpolates every other networked entity for display.
//!
//! There is no rendering or input-device layer here -- both are out of
//! scope for the core engine. This binary exercises the prediction and
//! interpolation plumbing end to end with a synthetic intent generator
//! standing in for a real input source.

mod config;
mod interp;
mod net;

use std::time::{Duration, Instant};

use clap::Parser;
use config::{Cli, ClientConfig};
use interp::RemoteInterpolator;
use seedfall_net::prediction::{reconcile, InputRing, PredictedState};
use seedfall_net::wire::Intent;
use tracing::info;

const PREDICTION_SPEED_PER_TICK: f32 = 0.1;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = ClientConfig::from_cli(&cli);

    let (intent_tx, mut snapshot_rx) = match net::connect(&config.server_addr).await {
        Ok(channels) => channels,
        Err(err) => {
            tracing::error!(?err, "failed to connect to server");
            return;
        }
    };

    let mut ring = InputRing::new();
    let mut predicted = PredictedState { x: 0.0, y: 0.0 };
    let mut remote = RemoteInterpolator::new();
    let mut seq: u64 = 0;

    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_hz);
    let start = Instant::now();

    loop {
        let tick_start = Instant::now();
        seq += 1;

        let intent = sample_intent(config.client_id, seq).clamped();
        ring.push(intent);
        predicted = seedfall_net::prediction::apply_intent(predicted, &intent, PREDICTION_SPEED_PER_TICK);
        let _ = intent_tx.send(intent);

        while let Ok(snapshot) = snapshot_rx.try_recv() {
            let now_ms = start.elapsed().as_secs_f64() * 1000.0;
            for delta in &snapshot.entities {
                if let Some((_, value)) = delta.components.iter().find(|(name, _)| name == "position") {
                    if let Ok(pos) = serde_json::from_value::<seedfall_sim::components::Position>(value.clone()) {
                        remote.record(delta.entity_id, now_ms, pos.x, pos.y);
                    }
                }
            }
            if let Some(server_state) = extract_local_state(&snapshot) {
                predicted = reconcile(&mut ring, server_state, snapshot.ack_seq, PREDICTION_SPEED_PER_TICK);
            }
        }

        let display_time_ms = start.elapsed().as_secs_f64() * 1000.0 - config.interp_delay_ms;
        let positions = remote.positions_at(display_time_ms, config.extrapolation_cap_ms);
        info!(x = predicted.x, y = predicted.y, tracked = positions.len(), "tick");

        let elapsed = tick_start.elapsed();
        if elapsed < tick_duration {
            tokio::time::sleep(tick_duration - elapsed).await;
        }
    }
}

/// Synthetic input source standing in for the real intent interface: walks
/// in a slow circle so prediction has something non-trivial to replay.
fn sample_intent(client_id: u32, seq: u64) -> Intent {
    let angle = (seq as f32) * 0.05;
    Intent {
        client_id,
        seq,
        move_x: angle.cos(),
        move_y: angle.sin(),
        aim_angle: angle,
        action_bits: 0,
    }
}

fn extract_local_state(snapshot: &seedfall_net::wire::Snapshot) -> Option<PredictedState> {
    let owned = snapshot.owned_entity?;
    let delta = snapshot.entities.iter().find(|d| d.entity_id == owned)?;
    let (_, value) = delta.components.iter().find(|(name, _)| name == "position")?;
    let pos = serde_json::from_value::<seedfall_sim::components::Position>(value.clone()).ok()?;
    Some(PredictedState { x: pos.x, y: pos.y })
}
