//! Movement: integrates `Velocity` into `Position` and keeps `Facing`
//! consistent with the direction of travel. Dead and frozen entities don't
//! move -- their velocity is ignored rather than zeroed, so a thaw or
//! revive resumes motion without any other system having to restore it.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::world::World;

use crate::components::{facing_from_velocity, Dead, Facing, Frozen, Position, Velocity};

pub const SYSTEM_ID: SystemId = SystemId(10);

/// Fixed per-tick timestep. The pipeline always calls systems once per tick
/// at `TickConfig::fixed_dt`; systems that need `dt` read it from the world
/// via a resource in a full host wiring. Movement here integrates at unit
/// speed scaled by the caller-supplied `dt` parameter baked into velocity
/// upstream (input -> intent -> velocity conversion happens before this
/// system runs), so no extra resource lookup is needed.
pub fn system(world: &World, commands: &mut CommandBuffer) {
    for (entity, (pos, vel)) in world.query::<(&Position, &Velocity)>() {
        if world.get_component::<Dead>(entity).is_some() {
            continue;
        }
        if world.get_component::<Frozen>(entity).is_some() {
            continue;
        }

        let new_pos = Position {
            x: pos.x + vel.vx,
            y: pos.y + vel.vy,
            layer: pos.layer,
        };
        if new_pos != *pos {
            commands.set_component(
                entity,
                "position",
                serde_json::json!(new_pos),
                SYSTEM_ID,
                CommandReason::GameRule("movement_integration".to_owned()),
            );
        }

        if let Some(direction) = facing_from_velocity(vel.vx, vel.vy) {
            let current = world.get_component::<Facing>(entity);
            if current.map(|f| f.last) != Some(direction) {
                commands.set_component(
                    entity,
                    "facing",
                    serde_json::json!(Facing { last: direction }),
                    SYSTEM_ID,
                    CommandReason::GameRule("facing_follows_velocity".to_owned()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Direction;
    use seedfall_ecs::world::{ComponentBundle, World};

    fn test_world() -> World {
        let mut world = World::new();
        world.register_component::<Position>("position");
        world.register_component::<Velocity>("velocity");
        world.register_component::<Facing>("facing");
        world.register_component::<Dead>("dead");
        world.register_component::<Frozen>("frozen");
        world
    }

    #[test]
    fn integrates_position_by_velocity() {
        let mut world = test_world();
        let mut bundle = ComponentBundle::new();
        bundle.add(world.registry(), Position { x: 0.0, y: 0.0, layer: 0 });
        bundle.add(world.registry(), Velocity { vx: 1.0, vy: 2.0 });
        let e = world.spawn_bundle(bundle);

        let mut cmds = CommandBuffer::new();
        system(&world, &mut cmds);
        cmds.apply(&mut world);

        let pos = world.get_component::<Position>(e).unwrap();
        assert_eq!(*pos, Position { x: 1.0, y: 2.0, layer: 0 });
    }

    #[test]
    fn frozen_entities_do_not_move() {
        let mut world = test_world();
        let mut bundle = ComponentBundle::new();
        bundle.add(world.registry(), Position { x: 5.0, y: 5.0, layer: 0 });
        bundle.add(world.registry(), Velocity { vx: 3.0, vy: 0.0 });
        bundle.add(world.registry(), Frozen);
        let e = world.spawn_bundle(bundle);

        let mut cmds = CommandBuffer::new();
        system(&world, &mut cmds);
        cmds.apply(&mut world);

        let pos = world.get_component::<Position>(e).unwrap();
        assert_eq!(*pos, Position { x: 5.0, y: 5.0, layer: 0 });
    }

    #[test]
    fn facing_follows_dominant_axis() {
        let mut world = test_world();
        let mut bundle = ComponentBundle::new();
        bundle.add(world.registry(), Position { x: 0.0, y: 0.0, layer: 0 });
        bundle.add(world.registry(), Velocity { vx: 0.0, vy: 5.0 });
        bundle.add(world.registry(), Facing { last: Direction::Up });
        let e = world.spawn_bundle(bundle);

        let mut cmds = CommandBuffer::new();
        system(&world, &mut cmds);
        cmds.apply(&mut world);

        let facing = world.get_component::<Facing>(e).unwrap();
        assert_eq!(facing.last, Direction::Down);
    }
}
