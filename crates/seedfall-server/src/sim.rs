//! The dedicated simulation thread. One thread owns the [`TickLoop`]; every
//! mutation reaches it through `rx`, and every outbound state reaches
//! clients through their own unbounded channel. Nothing here ever touches
//! a socket directly -- that's `net.rs`'s job.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::entity::EntityId;
use seedfall_ecs::world::ComponentBundle;
use seedfall_net::replication::{build_delta_snapshot, ClientBaseline, EntityState, InterestTable};
use seedfall_net::wire::{self, Snapshot};
use seedfall_sim::components::{Health, Intent as SimIntent, Networked, Position, Team, Velocity};
use seedfall_sim::pipeline::TickLoop;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::config::HostConfig;

const HOST_SYSTEM: SystemId = SystemId(0);

pub enum ServerMsg {
    Connect { client_id: u32, reply: oneshot::Sender<mpsc::UnboundedReceiver<Vec<u8>>> },
    Disconnect { client_id: u32 },
    Intent { client_id: u32, intent: wire::Intent },
}

struct PlayerHandle {
    entity: EntityId,
    baseline: ClientBaseline,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    last_seq: u64,
}

/// Run the fixed-timestep loop until the process exits. Blocks the calling
/// thread; the binary spawns this on its own `std::thread`, not a tokio task,
/// since the simulation never suspends mid-tick and has no need of an
/// async runtime. `tick_loop` arrives fully wired (components and systems
/// already registered) by the caller, either freshly generated or restored
/// from a save file.
pub fn run(config: HostConfig, mut tick_loop: TickLoop, mut rx: mpsc::UnboundedReceiver<ServerMsg>) {
    let mut players: HashMap<u32, PlayerHandle> = HashMap::new();
    let interest = InterestTable::new(0.0);
    let tick_duration = Duration::from_secs_f64(1.0 / config.tick_hz);

    loop {
        let tick_start = Instant::now();

        while let Ok(msg) = rx.try_recv() {
            handle_message(msg, &mut tick_loop, &mut players);
        }

        tick_loop.tick();
        broadcast_snapshots(&tick_loop, &mut players, &interest);

        let elapsed = tick_start.elapsed();
        if elapsed < tick_duration {
            std::thread::sleep(tick_duration - elapsed);
        }
    }
}

fn handle_message(msg: ServerMsg, tick_loop: &mut TickLoop, players: &mut HashMap<u32, PlayerHandle>) {
    match msg {
        ServerMsg::Connect { client_id, reply } => {
            let world = tick_loop.world_mut();
            let mut bundle = ComponentBundle::new();
            bundle.add(world.registry(), Position { x: 0.0, y: 0.0, layer: 0 });
            bundle.add(world.registry(), Velocity { vx: 0.0, vy: 0.0 });
            bundle.add(world.registry(), Health { current: 100.0, max: 100.0 });
            bundle.add(world.registry(), Team { id: client_id });
            bundle.add(world.registry(), Networked { last_sent_hash: 0, interest_score: 1.0 });
            let entity = world.spawn_bundle(bundle);

            let (tx, out_rx) = mpsc::unbounded_channel();
            players.insert(client_id, PlayerHandle { entity, baseline: ClientBaseline::new(), outbound: tx, last_seq: 0 });
            let _ = reply.send(out_rx);
            info!(client_id, "player connected");
        }
        ServerMsg::Disconnect { client_id } => {
            if let Some(handle) = players.remove(&client_id) {
                let mut cmds = CommandBuffer::new();
                cmds.despawn(handle.entity, HOST_SYSTEM, CommandReason::SystemInternal("client_disconnect".to_owned()));
                cmds.apply(tick_loop.world_mut());
                info!(client_id, "player disconnected");
            }
        }
        ServerMsg::Intent { client_id, intent } => {
            let intent = intent.clamped();
            let Some(handle) = players.get_mut(&client_id) else { return };
            if intent.seq <= handle.last_seq {
                warn!(client_id, seq = intent.seq, "dropping non-monotonic intent");
                return;
            }
            handle.last_seq = intent.seq;
            let mut cmds = CommandBuffer::new();
            cmds.set_component(
                handle.entity,
                "intent",
                serde_json::json!(SimIntent {
                    move_x: intent.move_x,
                    move_y: intent.move_y,
                    aim_angle: intent.aim_angle,
                    action_bits: intent.action_bits,
                    seq: intent.seq,
                }),
                HOST_SYSTEM,
                CommandReason::PlayerInput(format!("client_{client_id}")),
            );
            cmds.apply(tick_loop.world_mut());
        }
    }
}

fn broadcast_snapshots(tick_loop: &TickLoop, players: &mut HashMap<u32, PlayerHandle>, interest: &InterestTable) {
    let world = tick_loop.world();
    let entities: Vec<(EntityState, (f32, f32))> = world
        .query::<(&Position, &Networked)>()
        .map(|(entity, (pos, _))| {
            let mut components = vec![("position".to_owned(), serde_json::json!(pos))];
            if let Some(health) = world.get_component::<Health>(entity) {
                components.push(("health".to_owned(), serde_json::json!(health)));
            }
            let hash = content_hash(&components);
            (EntityState { entity_id: entity, hash, components }, (pos.x, pos.y))
        })
        .collect();

    for (client_id, handle) in players.iter_mut() {
        let viewer = entities
            .iter()
            .find(|(state, _)| state.entity_id == handle.entity)
            .map(|(_, pos)| *pos)
            .unwrap_or((0.0, 0.0));
        let deltas = build_delta_snapshot(&mut handle.baseline, interest, viewer, &entities);
        if deltas.is_empty() {
            continue;
        }
        let snapshot = Snapshot {
            server_tick: tick_loop.tick_count(),
            ack_seq: handle.last_seq,
            full_resync: false,
            entities: deltas,
            owned_entity: Some(handle.entity.to_raw()),
        };
        match wire::encode(&snapshot) {
            Ok(bytes) => {
                let _ = handle.outbound.send(bytes);
            }
            Err(err) => warn!(?err, client_id, "failed to encode snapshot"),
        }
    }
}

fn content_hash(components: &[(String, serde_json::Value)]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for (name, value) in components {
        hasher.update(name.as_bytes());
        hasher.update(value.to_string().as_bytes());
    }
    let digest = hasher.finalize();
    u64::from_le_bytes(digest.as_bytes()[0..8].try_into().unwrap())
}
