//! Wiring shared by every host shell: the component vocabulary must be
//! registered identically on client and server (the wire format assumes
//! matching component names), and the system pipeline must run in the
//! same fixed order everywhere for determinism to hold.

use seedfall_ecs::world::World;

use crate::components::*;
use crate::pipeline::TickLoop;
use crate::systems;

/// Register every component type the simulation knows about. Order doesn't
/// matter for correctness (each gets its own [`seedfall_ecs::component::ComponentTypeId`]),
/// but keeping it alphabetical-ish by subsystem makes the list easy to diff.
pub fn register_components(world: &mut World) {
    world.register_component::<Position>("position");
    world.register_component::<Velocity>("velocity");
    world.register_component::<Rotation>("rotation");
    world.register_component::<Aim>("aim");
    world.register_component::<Facing>("facing");
    world.register_component::<Health>("health");
    world.register_component::<Shield>("shield");
    world.register_component::<CombatStats>("combat_stats");
    world.register_component::<Team>("team");
    world.register_component::<Dead>("dead");
    world.register_component::<Frozen>("frozen");
    world.register_component::<StatusEffects>("status_effects");
    world.register_component::<Inventory>("inventory");
    world.register_component::<Equipment>("equipment");
    world.register_component::<Experience>("experience");
    world.register_component::<Collider>("collider");
    world.register_component::<TerrainGrid>("terrain_grid");
    world.register_component::<LayerComp>("layer");
    world.register_component::<AnimState>("anim_state");
    world.register_component::<Intent>("intent");
    world.register_component::<Networked>("networked");
    world.register_component::<Ai>("ai");
    world.register_component::<Puzzle>("puzzle");
    world.register_component::<SpellBook>("spell_book");
}

/// Register every gameplay system in the fixed contractual order: AI,
/// Combat, StatusEffect, Movement, Collision (layer transitions included),
/// Animation, Puzzle.
pub fn register_systems(tick_loop: &mut TickLoop) {
    tick_loop.add_system("ai", systems::ai::system);
    tick_loop.add_system_after("combat", &["ai"], systems::combat::system);
    tick_loop.add_system_after("status", &["combat"], systems::status::system);
    tick_loop.add_system_after("movement", &["status"], systems::movement::system);
    tick_loop.add_system_after("collision", &["movement"], systems::collision::system);
    tick_loop.add_system_after("animation", &["collision"], systems::animation::system);
    tick_loop.add_system_after("puzzle", &["animation"], systems::puzzle::system);
}
