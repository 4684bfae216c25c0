//! Combat: aim-cone target acquisition, the damage pipeline, cooldowns, and
//! the elemental on-hit effects that follow a successful attack.
//!
//! The damage pipeline is a strict three-stage reduction:
//! `raw -> after defense -> after resistance`, and the result drains any
//! shield before touching health. Nothing here applies damage directly --
//! every step is a queued `set_component` against `Health`/`Shield`.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::entity::EntityId;
use seedfall_ecs::world::World;

use crate::components::{
    Aim, CombatStats, Dead, Health, Inventory, Position, Shield, SpellBook, StatusEffect,
    StatusEffects, StatusKind, Team,
};
use crate::systems::status;
use seedfall_procgen::content::{ContentId, DamageKind};

pub const SYSTEM_ID: SystemId = SystemId(30);

/// Full width of the aim cone, in radians (45 degrees).
const AIM_CONE_WIDTH: f32 = std::f32::consts::FRAC_PI_4;
const AIM_CONE_HALF: f32 = AIM_CONE_WIDTH / 2.0;

/// Maximum distance between consecutive chain-lightning hops.
const CHAIN_RANGE: f32 = 150.0;

/// Angle between the aim direction and the direction to a candidate target,
/// normalized to `[0, PI]`.
fn angle_to(aim_angle: f32, from: &Position, to: &Position) -> f32 {
    let target_angle = (to.y - from.y).atan2(to.x - from.x);
    let mut diff = (target_angle - aim_angle) % std::f32::consts::TAU;
    if diff > std::f32::consts::PI {
        diff -= std::f32::consts::TAU;
    }
    if diff < -std::f32::consts::PI {
        diff += std::f32::consts::TAU;
    }
    diff.abs()
}

/// Pick an attack target for `attacker`: the nearest enemy within the aim
/// cone, or failing that the nearest enemy of any angle (so an attack never
/// whiffs purely because the stick drifted a degree off target).
pub fn acquire_target(
    world: &World,
    attacker: EntityId,
    attacker_pos: &Position,
    attacker_team: &Team,
    aim_angle: f32,
) -> Option<EntityId> {
    let mut in_cone: Option<(EntityId, f32)> = None;
    let mut nearest_any: Option<(EntityId, f32)> = None;

    for (candidate, (pos, team)) in world.query::<(&Position, &Team)>() {
        if candidate == attacker || team.id == attacker_team.id {
            continue;
        }
        if world.get_component::<Dead>(candidate).is_some() {
            continue;
        }
        let dist = ((pos.x - attacker_pos.x).powi(2) + (pos.y - attacker_pos.y).powi(2)).sqrt();

        if nearest_any.map(|(_, d)| dist < d).unwrap_or(true) {
            nearest_any = Some((candidate, dist));
        }

        let angle = angle_to(aim_angle, attacker_pos, pos);
        if angle <= AIM_CONE_HALF && in_cone.map(|(_, d)| dist < d).unwrap_or(true) {
            in_cone = Some((candidate, dist));
        }
    }

    in_cone.or(nearest_any).map(|(e, _)| e)
}

/// Reduce `raw` through defense then resistance, per the fixed pipeline
/// order. Defense subtracts flat but always leaves at least 1 point through
/// -- an attack against an overleveled defender chips away rather than
/// doing nothing -- and resistance then scales that floor.
pub fn compute_damage(raw: f32, defense: f32, resistance: f32) -> f32 {
    let after_defense = (raw - defense).max(1.0);
    after_defense * (1.0 - resistance.clamp(0.0, 1.0))
}

/// Fixed-timestep dt baked into the combat pipeline, matching
/// `TickConfig::fixed_dt`'s default of 1/60s.
fn tick_dt() -> f32 {
    1.0 / 60.0
}

/// Apply `amount` of damage to shield first, then health. Returns
/// `(new_shield, new_health)`.
pub fn apply_damage_to_pools(shield: f32, health: f32, amount: f32) -> (f32, f32) {
    let absorbed = amount.min(shield);
    let remaining = amount - absorbed;
    let new_shield = shield - absorbed;
    let new_health = (health - remaining).max(0.0);
    (new_shield, new_health)
}

/// A dead entity's inventory is emptied within one tick of death, whatever
/// killed it -- this runs unconditionally, ahead of target acquisition, so
/// `Pickup` can never observe a dead entity still holding items.
fn clear_dead_inventories(world: &World, commands: &mut CommandBuffer) {
    for (entity, (inventory,)) in world.query::<(&Inventory,)>() {
        if world.get_component::<Dead>(entity).is_none() {
            continue;
        }
        if inventory.slots.iter().all(|slot| slot.is_none()) {
            continue;
        }
        commands.set_component(
            entity,
            "inventory",
            serde_json::json!(Inventory { slots: vec![None; inventory.slots.len()] }),
            SYSTEM_ID,
            CommandReason::GameRule("inventory_cleared_on_death".to_owned()),
        );
    }
}

pub fn system(world: &World, commands: &mut CommandBuffer) {
    clear_dead_inventories(world, commands);

    for (attacker, (pos, aim, team, stats)) in
        world.query::<(&Position, &Aim, &Team, &CombatStats)>()
    {
        if world.get_component::<Dead>(attacker).is_some() {
            continue;
        }

        if stats.cooldown_timer > 0.0 {
            let new_timer = (stats.cooldown_timer - tick_dt()).max(0.0);
            commands.set_component(
                attacker,
                "combat_stats",
                serde_json::json!(CombatStats { cooldown_timer: new_timer, ..stats.clone() }),
                SYSTEM_ID,
                CommandReason::Timer("attack_cooldown_tick".to_owned()),
            );
            continue;
        }

        let Some(target) = acquire_target(world, attacker, pos, team, aim.angle) else {
            continue;
        };

        let landed = apply_attack(world, commands, attacker, target, stats.damage_kind, stats.attack);
        if !landed {
            continue;
        }
        if stats.damage_kind == DamageKind::Lightning {
            chain_from(world, commands, attacker, target, stats.attack);
        }

        commands.set_component(
            attacker,
            "combat_stats",
            serde_json::json!(CombatStats { cooldown_timer: stats.cooldown, ..stats.clone() }),
            SYSTEM_ID,
            CommandReason::Timer("attack_cooldown_start".to_owned()),
        );
    }

    cast_system(world, commands);
}

/// Resolve one hit of `damage_kind` for `raw_damage` against `target`:
/// defense/resistance reduction, shield-then-health absorption, the `Dead`
/// marker on lethal damage, and (for a kind with one) the elemental on-hit
/// status proc. Chain lightning is the caller's responsibility -- this never
/// recurses, so a chain hop calling back in here can't cascade into a second
/// chain.
fn apply_attack(
    world: &World,
    commands: &mut CommandBuffer,
    attacker: EntityId,
    target: EntityId,
    damage_kind: DamageKind,
    raw_damage: f32,
) -> bool {
    if world.get_component::<Dead>(target).is_some() {
        return false;
    }
    let Some(target_health) = world.get_component::<Health>(target) else {
        return false;
    };
    let target_stats = world.get_component::<CombatStats>(target);
    let target_resist =
        target_stats.and_then(|s| s.resistances.get(&damage_kind).copied()).unwrap_or(0.0);
    let target_defense = target_stats.map(|s| s.defense).unwrap_or(0.0);
    let target_shield = world.get_component::<Shield>(target).map(|s| s.amount).unwrap_or(0.0);

    let damage = compute_damage(raw_damage, target_defense, target_resist);
    if damage <= 0.0 {
        return false;
    }

    let (new_shield, new_health) =
        apply_damage_to_pools(target_shield, target_health.current, damage);

    if new_shield != target_shield {
        commands.set_component(
            target,
            "shield",
            serde_json::json!(Shield {
                amount: new_shield,
                max_amount: world.get_component::<Shield>(target).map(|s| s.max_amount).unwrap_or(0.0),
                duration: world.get_component::<Shield>(target).map(|s| s.duration).unwrap_or(0.0),
                max_duration: world.get_component::<Shield>(target).map(|s| s.max_duration).unwrap_or(0.0),
            }),
            SYSTEM_ID,
            CommandReason::CollisionResponse(attacker, target),
        );
    }
    commands.set_component(
        target,
        "health",
        serde_json::json!(Health { current: new_health, max: target_health.max }),
        SYSTEM_ID,
        CommandReason::GameRule("damage_applied".to_owned()),
    );

    if new_health <= 0.0 {
        commands.set_component(
            target,
            "dead",
            serde_json::json!(Dead),
            SYSTEM_ID,
            CommandReason::GameRule("health_depleted".to_owned()),
        );
        return true;
    }

    if let Some(effect) = elemental_proc(damage_kind) {
        if let Some(pool) = world.get_component::<StatusEffects>(target) {
            if let Some(new_pool) = status::acquire(pool, effect) {
                commands.set_component(
                    target,
                    "status_effects",
                    serde_json::json!(new_pool),
                    SYSTEM_ID,
                    CommandReason::GameRule("elemental_proc_applied".to_owned()),
                );
            }
        }
    }

    true
}

/// Walk up to three chain-lightning hops out from `origin`, each time
/// striking the nearest un-hit enemy within [`CHAIN_RANGE`] for the next
/// decayed fraction of `base_damage`. Stops early once no further un-hit
/// enemy is in range.
fn chain_from(
    world: &World,
    commands: &mut CommandBuffer,
    attacker: EntityId,
    origin: EntityId,
    base_damage: f32,
) {
    let attacker_team = world.get_component::<Team>(attacker);
    let mut already_hit = vec![attacker, origin];
    let mut current = origin;

    for hop_damage in chain_lightning_hops(base_damage) {
        let Some(current_pos) = world.get_component::<Position>(current) else { break };
        let Some(next) = nearest_unhit_enemy(world, current_pos, attacker_team, &already_hit) else {
            break;
        };
        apply_attack(world, commands, attacker, next, DamageKind::Lightning, hop_damage);
        already_hit.push(next);
        current = next;
    }
}

/// Nearest living enemy to `from`, excluding everyone in `exclude`, within
/// [`CHAIN_RANGE`].
fn nearest_unhit_enemy(
    world: &World,
    from: &Position,
    attacker_team: Option<&Team>,
    exclude: &[EntityId],
) -> Option<EntityId> {
    let mut nearest: Option<(EntityId, f32)> = None;
    for (candidate, (pos, team)) in world.query::<(&Position, &Team)>() {
        if exclude.contains(&candidate) {
            continue;
        }
        if attacker_team.map(|t| t.id == team.id).unwrap_or(false) {
            continue;
        }
        if world.get_component::<Dead>(candidate).is_some() {
            continue;
        }
        let dist = ((pos.x - from.x).powi(2) + (pos.y - from.y).powi(2)).sqrt();
        if dist > CHAIN_RANGE {
            continue;
        }
        if nearest.map(|(_, d)| dist < d).unwrap_or(true) {
            nearest = Some((candidate, dist));
        }
    }
    nearest.map(|(e, _)| e)
}

/// Explicit cast: look up `spell_id` in `caster`'s spell book, acquire a
/// target along `aim_angle`'s cone the same way a basic attack does, and
/// apply its damage kind -- chain lightning included. Returns whether the
/// cast actually landed a hit.
pub fn cast(
    world: &World,
    commands: &mut CommandBuffer,
    caster: EntityId,
    spell_id: ContentId,
    aim_angle: f32,
) -> bool {
    let Some(book) = world.get_component::<SpellBook>(caster) else { return false };
    let Some(spell) = book.spells.iter().find(|s| s.id == spell_id) else { return false };
    let Some(pos) = world.get_component::<Position>(caster) else { return false };
    let Some(team) = world.get_component::<Team>(caster) else { return false };

    let Some(target) = acquire_target(world, caster, pos, team, aim_angle) else { return false };

    let base_damage = spell.base_damage as f32;
    let damage_kind = spell.damage_kind;
    let landed = apply_attack(world, commands, caster, target, damage_kind, base_damage);
    if landed && damage_kind == DamageKind::Lightning {
        chain_from(world, commands, caster, target, base_damage);
    }
    landed
}

/// Auto-cast loop: every entity carrying a [`SpellBook`] fires its active
/// spell at its current aim the moment the shared cast cooldown clears, the
/// same unconditional convention the basic attack above follows.
fn cast_system(world: &World, commands: &mut CommandBuffer) {
    for (caster, (aim, book)) in world.query::<(&Aim, &SpellBook)>() {
        if world.get_component::<Dead>(caster).is_some() {
            continue;
        }

        if book.cooldown_timer > 0.0 {
            let new_timer = (book.cooldown_timer - tick_dt()).max(0.0);
            commands.set_component(
                caster,
                "spell_book",
                serde_json::json!(SpellBook { cooldown_timer: new_timer, ..book.clone() }),
                SYSTEM_ID,
                CommandReason::Timer("spell_cooldown_tick".to_owned()),
            );
            continue;
        }

        let Some(spell) = book.spells.get(book.active) else { continue };
        let spell_id = spell.id;
        let cooldown_secs = spell.cooldown_secs as f32;

        cast(world, commands, caster, spell_id, aim.angle);

        commands.set_component(
            caster,
            "spell_book",
            serde_json::json!(SpellBook { cooldown_timer: cooldown_secs, ..book.clone() }),
            SYSTEM_ID,
            CommandReason::Timer("spell_cooldown_start".to_owned()),
        );
    }
}

/// Status effect a given elemental damage kind applies on hit, per the
/// fixed proc table. `None` for `Physical` -- it carries no status.
pub fn elemental_proc(kind: DamageKind) -> Option<StatusEffect> {
    match kind {
        DamageKind::Physical => None,
        DamageKind::Fire => Some(StatusEffect {
            kind: StatusKind::Burning,
            duration: 5.0,
            magnitude: 10.0,
            tick_interval: 1.0,
            next_tick: 1.0,
        }),
        DamageKind::Ice => Some(StatusEffect {
            kind: StatusKind::Frozen,
            duration: 3.0,
            magnitude: 0.0,
            tick_interval: 3.0,
            next_tick: 3.0,
        }),
        DamageKind::Lightning => None, // handled via chain_lightning_hops, not a status
        DamageKind::Poison => Some(StatusEffect {
            kind: StatusKind::Poisoned,
            duration: 8.0,
            magnitude: 5.0,
            tick_interval: 1.0,
            next_tick: 1.0,
        }),
    }
}

/// Damage fraction retained at each successive chain-lightning hop (hop 1 =
/// 70%, hop 2 = 49%, hop 3 = 34.3%), capped at three hops.
pub fn chain_lightning_hops(base_damage: f32) -> Vec<f32> {
    let mut hops = Vec::with_capacity(3);
    let mut remaining = base_damage;
    for _ in 0..3 {
        remaining *= 0.7;
        hops.push(remaining);
    }
    hops
}
