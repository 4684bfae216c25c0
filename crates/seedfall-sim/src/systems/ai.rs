//! Minimal behavior-tag AI: steers an NPC's `Intent` toward its current
//! target, acquiring one by nearest-enemy search when it has none or the
//! old target died.
//!
//! This is deliberately small -- a single "chase" behavior -- because the
//! spec's content generators supply the variety (different stat blocks,
//! different skills) rather than a large behavior-tree library.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::world::World;

use crate::components::{Ai, Dead, Intent, Position, Team};

pub const SYSTEM_ID: SystemId = SystemId(50);

fn nearest_enemy(
    world: &World,
    self_entity: seedfall_ecs::entity::EntityId,
    pos: &Position,
    team: &Team,
) -> Option<seedfall_ecs::entity::EntityId> {
    world
        .query::<(&Position, &Team)>()
        .filter(|(e, (_, t))| *e != self_entity && t.id != team.id)
        .filter(|(e, _)| world.get_component::<Dead>(*e).is_none())
        .min_by(|(_, (pa, _)), (_, (pb, _))| {
            let da = (pa.x - pos.x).powi(2) + (pa.y - pos.y).powi(2);
            let db = (pb.x - pos.x).powi(2) + (pb.y - pos.y).powi(2);
            da.partial_cmp(&db).unwrap()
        })
        .map(|(e, _)| e)
}

pub fn system(world: &World, commands: &mut CommandBuffer) {
    for (entity, (ai, pos, team)) in world.query::<(&Ai, &Position, &Team)>() {
        if world.get_component::<Dead>(entity).is_some() {
            continue;
        }

        let target = match ai.target {
            Some(t) if world.get_component::<Dead>(t).is_none() && world.get_component::<Position>(t).is_some() => Some(t),
            _ => nearest_enemy(world, entity, pos, team),
        };

        if target != ai.target {
            commands.set_component(
                entity,
                "ai",
                serde_json::json!(Ai {
                    behavior_tag: ai.behavior_tag.clone(),
                    target,
                    state: ai.state.clone(),
                }),
                SYSTEM_ID,
                CommandReason::GameRule("ai_target_reacquired".to_owned()),
            );
        }

        let Some(target) = target else { continue };
        let Some(target_pos) = world.get_component::<Position>(target) else { continue };

        let dx = target_pos.x - pos.x;
        let dy = target_pos.y - pos.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < 1e-4 {
            continue;
        }
        let aim_angle = dy.atan2(dx);

        commands.set_component(
            entity,
            "intent",
            serde_json::json!(Intent {
                move_x: dx / dist,
                move_y: dy / dist,
                aim_angle,
                action_bits: 0,
                seq: 0,
            }),
            SYSTEM_ID,
            CommandReason::GameRule("ai_chase_intent".to_owned()),
        );
    }
}
