//! Status effect pool: ticks damage-over-time effects, expires effects past
//! their duration, and keeps the `Frozen` marker in sync with whichever
//! pool slot (if any) currently holds a `Frozen` effect.
//!
//! Buffs and debuffs (Strength/Weakness/Fortify/Vulnerability) are read
//! directly out of the pool by the combat system rather than folded into
//! `CombatStats` here, so their magnitude never has to be un-applied on
//! expiry -- there is nothing to subtract back out.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::world::World;

use crate::components::{Frozen, Health, StatusEffects, StatusKind};

pub const SYSTEM_ID: SystemId = SystemId(25);

/// Acquire a free slot in `pool` for `effect`, returning the mutated pool.
/// Returns `None` if the pool is full -- the caller drops the application
/// rather than growing the pool, which keeps its size fixed per entity.
pub fn acquire(pool: &StatusEffects, effect: crate::components::StatusEffect) -> Option<StatusEffects> {
    let mut slots = pool.slots.clone();
    let free = slots.iter().position(|s| s.is_none())?;
    slots[free] = Some(effect);
    Some(StatusEffects { slots })
}

/// Release the slot holding an effect of `kind`, if any.
pub fn release(pool: &StatusEffects, kind: StatusKind) -> StatusEffects {
    let mut slots = pool.slots.clone();
    for slot in slots.iter_mut() {
        if slot.map(|e| e.kind) == Some(kind) {
            *slot = None;
        }
    }
    StatusEffects { slots }
}

pub fn system(world: &World, commands: &mut CommandBuffer) {
    for (entity, (pool,)) in world.query::<(&StatusEffects,)>() {
        let mut slots = pool.slots.clone();
        let mut changed = false;
        let mut had_frozen = false;
        let mut dot_damage: f32 = 0.0;

        for slot in slots.iter_mut() {
            let Some(effect) = slot else { continue };
            if effect.kind == StatusKind::Frozen {
                had_frozen = true;
            }

            let mut remaining = effect.duration;
            let mut next_tick = effect.next_tick;
            remaining -= tick_dt();
            next_tick -= tick_dt();
            if is_damage_over_time(effect.kind) && next_tick <= 0.0 {
                dot_damage += effect.magnitude;
                next_tick = effect.tick_interval;
            }

            if remaining <= 0.0 {
                *slot = None;
                changed = true;
            } else {
                effect.duration = remaining;
                effect.next_tick = next_tick;
                changed = true;
            }
        }

        let has_frozen = slots.iter().flatten().any(|e| e.kind == StatusKind::Frozen);

        if dot_damage > 0.0 {
            if let Some(health) = world.get_component::<Health>(entity) {
                let new_current = (health.current - dot_damage).max(0.0);
                commands.set_component(
                    entity,
                    "health",
                    serde_json::json!(Health { current: new_current, max: health.max }),
                    SYSTEM_ID,
                    CommandReason::Timer("status_dot_tick".to_owned()),
                );
            }
        }

        if had_frozen != has_frozen {
            if has_frozen {
                commands.set_component(
                    entity,
                    "frozen",
                    serde_json::json!(Frozen),
                    SYSTEM_ID,
                    CommandReason::StateTransition {
                        from: "thawed".to_owned(),
                        to: "frozen".to_owned(),
                    },
                );
            } else {
                commands.remove_component(
                    entity,
                    "frozen",
                    SYSTEM_ID,
                    CommandReason::StateTransition {
                        from: "frozen".to_owned(),
                        to: "thawed".to_owned(),
                    },
                );
            }
        }

        if changed {
            commands.set_component(
                entity,
                "status_effects",
                serde_json::json!(StatusEffects { slots }),
                SYSTEM_ID,
                CommandReason::GameRule("status_pool_advanced".to_owned()),
            );
        }
    }
}

/// Fixed-timestep dt baked into the status pipeline. Matches
/// `TickConfig::fixed_dt`'s default of 1/60s scaled up to the effect
/// system's coarser 1-second tick granularity is handled by `tick_interval`
/// itself, not here; this is the per-pipeline-tick decrement.
fn tick_dt() -> f32 {
    1.0 / 60.0
}

fn is_damage_over_time(kind: StatusKind) -> bool {
    matches!(kind, StatusKind::Burning | StatusKind::Poisoned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::StatusEffect;

    fn burning(duration: f32) -> StatusEffect {
        StatusEffect { kind: StatusKind::Burning, duration, magnitude: 10.0, tick_interval: 1.0, next_tick: 1.0 }
    }

    #[test]
    fn acquire_fills_first_free_slot() {
        let pool = StatusEffects::with_capacity(2);
        let pool = acquire(&pool, burning(5.0)).unwrap();
        assert!(pool.slots[0].is_some());
        assert!(pool.slots[1].is_none());
    }

    #[test]
    fn acquire_fails_when_pool_is_full() {
        let mut pool = StatusEffects::with_capacity(1);
        pool.slots[0] = Some(burning(5.0));
        assert!(acquire(&pool, burning(3.0)).is_none());
    }

    #[test]
    fn release_clears_matching_kind_only() {
        let mut pool = StatusEffects::with_capacity(2);
        pool.slots[0] = Some(burning(5.0));
        pool.slots[1] = Some(StatusEffect { kind: StatusKind::Poisoned, duration: 8.0, magnitude: 5.0, tick_interval: 1.0, next_tick: 1.0 });
        let pool = release(&pool, StatusKind::Burning);
        assert!(pool.slots[0].is_none());
        assert!(pool.slots[1].is_some());
    }
}
