//! Animation state machine: idle/walk/run/attack/hit/cast/death.
//!
//! Movement-driven states (idle/walk/run) are overridden freely by velocity
//! each tick. Action states (attack/hit/cast) are atomic once entered --
//! only their own completion exits them, never a change in velocity -- and
//! death is terminal: nothing transitions out of it.
//!
//! `set_state` always resets `frame_idx` and re-arms `on_complete`, even
//! when the requested state equals the current one, so re-triggering an
//! attack mid-animation restarts it cleanly instead of being a no-op.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::world::World;

use crate::components::{AnimState, AnimStateKind, Dead, Velocity};

pub const SYSTEM_ID: SystemId = SystemId(40);

const RUN_SPEED_THRESHOLD: f32 = 3.0;
const MOVE_EPSILON: f32 = 1e-4;

/// Build the `AnimState` that results from entering `requested`, from
/// whatever `current` was. Always resets `frame_idx`/`frame_time` and
/// re-arms `on_complete`.
pub fn set_state(current: &AnimState, requested: AnimStateKind, on_complete: Option<AnimStateKind>) -> AnimState {
    AnimState {
        state: requested,
        frame_idx: 0,
        frame_time: 0.0,
        loop_anim: matches!(requested, AnimStateKind::Idle | AnimStateKind::Walk | AnimStateKind::Run),
        dirty: true,
        last_facing: current.last_facing,
        on_complete,
    }
}

/// What movement alone would request, ignoring any in-progress action state.
fn movement_state(vx: f32, vy: f32) -> AnimStateKind {
    let speed = (vx * vx + vy * vy).sqrt();
    if speed < MOVE_EPSILON {
        AnimStateKind::Idle
    } else if speed >= RUN_SPEED_THRESHOLD {
        AnimStateKind::Run
    } else {
        AnimStateKind::Walk
    }
}

pub fn system(world: &World, commands: &mut CommandBuffer) {
    for (entity, (anim, vel)) in world.query::<(&AnimState, &Velocity)>() {
        if world.get_component::<Dead>(entity).is_some() {
            if anim.state != AnimStateKind::Death {
                let next = set_state(anim, AnimStateKind::Death, None);
                emit(commands, entity, &next);
            }
            continue;
        }

        if anim.state.is_action_state() {
            // Atomic: only advance/expire, never preempted by movement.
            continue;
        }

        let requested = movement_state(vel.vx, vel.vy);
        if requested != anim.state {
            let next = set_state(anim, requested, None);
            emit(commands, entity, &next);
        }
    }
}

fn emit(commands: &mut CommandBuffer, entity: seedfall_ecs::entity::EntityId, next: &AnimState) {
    commands.set_component(
        entity,
        "anim_state",
        serde_json::json!(next),
        SYSTEM_ID,
        CommandReason::StateTransition {
            from: "movement".to_owned(),
            to: format!("{:?}", next.state),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Direction;

    fn idle_state() -> AnimState {
        AnimState {
            state: AnimStateKind::Idle,
            frame_idx: 3,
            frame_time: 0.2,
            loop_anim: true,
            dirty: false,
            last_facing: Direction::Down,
            on_complete: None,
        }
    }

    #[test]
    fn movement_state_picks_idle_walk_run() {
        assert_eq!(movement_state(0.0, 0.0), AnimStateKind::Idle);
        assert_eq!(movement_state(1.0, 0.0), AnimStateKind::Walk);
        assert_eq!(movement_state(4.0, 0.0), AnimStateKind::Run);
    }

    #[test]
    fn set_state_always_resets_frame_even_if_unchanged() {
        let current = idle_state();
        let next = set_state(&current, AnimStateKind::Idle, None);
        assert_eq!(next.frame_idx, 0);
        assert!(next.dirty);
    }

    #[test]
    fn set_state_preserves_facing() {
        let current = idle_state();
        let next = set_state(&current, AnimStateKind::Walk, None);
        assert_eq!(next.last_facing, Direction::Down);
    }

    #[test]
    fn action_states_are_not_loops() {
        let current = idle_state();
        let next = set_state(&current, AnimStateKind::Attack, Some(AnimStateKind::Idle));
        assert!(!next.loop_anim);
        assert_eq!(next.on_complete, Some(AnimStateKind::Idle));
    }
}
