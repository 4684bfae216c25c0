//! Collision: resolves entity-vs-terrain overlap and entity-vs-entity AABB
//! overlap, respecting the three collision layers (0 = ground, 1 = airborne,
//! 2 = platform) and diagonal-wall tiles, and drives layer transitions when
//! an entity steps onto a ramp.
//!
//! Diagonal walls (`WallNE`/`WallNW`/`WallSE`/`WallSW`) carve a triangular
//! solid region out of their tile rather than the full square, so a moving
//! AABB is tested against the triangle's hypotenuse edge with a simple
//! separating-axis check instead of being blocked by the whole tile.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::entity::EntityId;
use seedfall_ecs::world::World;

use crate::components::{Collider, LayerComp, Position, TerrainGrid};
use seedfall_procgen::terrain::TileKind;

pub const SYSTEM_ID: SystemId = SystemId(20);

/// Per-tick rate at which `transition_progress` advances while an entity is
/// crossing a ramp from one layer to another.
const LAYER_TRANSITION_RATE: f32 = 0.25;

pub fn system(world: &World, commands: &mut CommandBuffer) {
    let Some((_, (grid,))) = world.query::<(&TerrainGrid,)>().next() else {
        return;
    };

    resolve_terrain_collisions(world, &grid.map, commands);
    advance_layer_transitions(world, &grid.map, commands);
    resolve_entity_collisions(world, commands);
}

fn resolve_terrain_collisions(
    world: &World,
    map: &seedfall_procgen::terrain::TerrainMap,
    commands: &mut CommandBuffer,
) {
    for (entity, (pos, collider)) in world.query::<(&Position, &Collider)>() {
        if !collider.solid {
            continue;
        }
        let tile_x = pos.x.floor() as i32;
        let tile_y = pos.y.floor() as i32;
        let Some(tile) = map.get(tile_x, tile_y) else {
            continue;
        };

        if tile.walkable_for_layer(pos.layer) {
            continue;
        }

        if tile.is_diagonal_wall() && is_inside_diagonal_triangle(tile, pos.x.fract(), pos.y.fract()) {
            continue;
        }

        // Push the entity back to the tile center -- a minimal, deterministic
        // resolution; the aim is correctness (never end up inside a solid
        // tile), not a polished slide response.
        let resolved = Position {
            x: tile_x as f32 + 0.5,
            y: tile_y as f32 + 0.5,
            layer: pos.layer,
        };
        commands.set_component(
            entity,
            "position",
            serde_json::json!(resolved),
            SYSTEM_ID,
            CommandReason::GameRule("terrain_collision".to_owned()),
        );
    }
}

/// Whether `(fx, fy)` (fractional position within the tile, `[0, 1)`) falls
/// on the walkable side of a diagonal wall's hypotenuse.
fn is_inside_diagonal_triangle(tile: TileKind, fx: f32, fy: f32) -> bool {
    match tile {
        TileKind::WallNE => fx + fy >= 1.0,
        TileKind::WallNW => fx <= fy,
        TileKind::WallSE => fx >= fy,
        TileKind::WallSW => fx + fy <= 1.0,
        _ => true,
    }
}

fn advance_layer_transitions(
    world: &World,
    map: &seedfall_procgen::terrain::TerrainMap,
    commands: &mut CommandBuffer,
) {
    for (entity, (pos, layer)) in world.query::<(&Position, &LayerComp)>() {
        let tile = map.get(pos.x.floor() as i32, pos.y.floor() as i32);
        let on_ramp = matches!(tile, Some(TileKind::Ramp));

        let mut next = *layer;
        if layer.target < 0 {
            if on_ramp {
                let to = if layer.current == 0 { 2 } else { 0 };
                next.target = to as i8;
                next.transition_progress = 0.0;
            } else {
                continue;
            }
        } else {
            next.transition_progress += LAYER_TRANSITION_RATE;
            if next.transition_progress >= 1.0 {
                next.current = next.target as u8;
                next.target = -1;
                next.transition_progress = 0.0;
            }
        }

        if next != *layer {
            commands.set_component(
                entity,
                "layer_comp",
                serde_json::json!(next),
                SYSTEM_ID,
                CommandReason::StateTransition {
                    from: layer.current.to_string(),
                    to: next.current.to_string(),
                },
            );
        }
    }
}

/// Pushes overlapping solid entities apart along the axis of least overlap,
/// split evenly between the pair. Entities on different layers never touch.
fn resolve_entity_collisions(world: &World, commands: &mut CommandBuffer) {
    let entities: Vec<(EntityId, Position, Collider)> = world
        .query::<(&Position, &Collider)>()
        .filter(|(_, (_, c))| c.solid)
        .map(|(e, (p, c))| (e, *p, *c))
        .collect();

    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            let (ea, pa, ca) = &entities[i];
            let (eb, pb, cb) = &entities[j];
            if pa.layer != pb.layer {
                continue;
            }
            if !aabb_overlap(pa, ca, pb, cb) {
                continue;
            }

            let overlap_x = (ca.w + cb.w) / 2.0 - (pa.x - pb.x).abs();
            let overlap_y = (ca.h + cb.h) / 2.0 - (pa.y - pb.y).abs();
            let reason = CommandReason::CollisionResponse(*ea, *eb);

            if overlap_x < overlap_y {
                let dir = if pa.x < pb.x { -1.0 } else { 1.0 };
                let shift = overlap_x / 2.0 * dir;
                push(commands, *ea, pa, shift, 0.0, reason.clone());
                push(commands, *eb, pb, -shift, 0.0, reason);
            } else {
                let dir = if pa.y < pb.y { -1.0 } else { 1.0 };
                let shift = overlap_y / 2.0 * dir;
                push(commands, *ea, pa, 0.0, shift, reason.clone());
                push(commands, *eb, pb, 0.0, -shift, reason);
            }
        }
    }
}

fn push(
    commands: &mut CommandBuffer,
    entity: EntityId,
    pos: &Position,
    dx: f32,
    dy: f32,
    reason: CommandReason,
) {
    let resolved = Position { x: pos.x + dx, y: pos.y + dy, layer: pos.layer };
    commands.set_component(entity, "position", serde_json::json!(resolved), SYSTEM_ID, reason);
}

fn aabb_overlap(pa: &Position, ca: &Collider, pb: &Position, cb: &Collider) -> bool {
    let ax0 = pa.x - ca.w / 2.0;
    let ax1 = pa.x + ca.w / 2.0;
    let ay0 = pa.y - ca.h / 2.0;
    let ay1 = pa.y + ca.h / 2.0;
    let bx0 = pb.x - cb.w / 2.0;
    let bx1 = pb.x + cb.w / 2.0;
    let by0 = pb.y - cb.h / 2.0;
    let by1 = pb.y + cb.h / 2.0;
    ax0 < bx1 && ax1 > bx0 && ay0 < by1 && ay1 > by0
}
