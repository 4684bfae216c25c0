//! Puzzle runtime: checks a live `Puzzle`'s accumulated activation order
//! against its generated witness and flips it to `Solved` the moment the
//! two match -- a permuted or partial order simply leaves it `Unsolved`.

use seedfall_ecs::command::{CommandBuffer, CommandReason, SystemId};
use seedfall_ecs::world::World;
use seedfall_procgen::puzzle::verify_witness;

use crate::components::{Puzzle, PuzzleRuntimeState};

pub const SYSTEM_ID: SystemId = SystemId(55);

/// Append `element_idx` to the puzzle's in-progress activation order.
pub fn activate(puzzle: &Puzzle, element_idx: usize) -> Puzzle {
    let mut solved_order = puzzle.solved_order.clone();
    solved_order.push(element_idx);
    Puzzle { solved_order, ..puzzle.clone() }
}

pub fn system(world: &World, commands: &mut CommandBuffer) {
    for (entity, (puzzle,)) in world.query::<(&Puzzle,)>() {
        if puzzle.state == PuzzleRuntimeState::Solved {
            continue;
        }
        if puzzle.solved_order.len() != puzzle.witness.len() {
            continue;
        }
        if !verify_witness(puzzle.kind, &puzzle.elements, &puzzle.witness, &puzzle.solved_order) {
            continue;
        }
        commands.set_component(
            entity,
            "puzzle",
            serde_json::json!(Puzzle { state: PuzzleRuntimeState::Solved, ..puzzle.clone() }),
            SYSTEM_ID,
            CommandReason::StateTransition { from: "unsolved".to_owned(), to: "solved".to_owned() },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfall_procgen::puzzle::PuzzleKind;

    fn puzzle(witness: Vec<usize>) -> Puzzle {
        Puzzle {
            kind: PuzzleKind::PressurePlate,
            elements: (0..witness.len() as u32).collect(),
            witness,
            solved_order: Vec::new(),
            state: PuzzleRuntimeState::Unsolved,
        }
    }

    #[test]
    fn activate_appends_to_solved_order() {
        let p = puzzle(vec![2, 0, 1]);
        let p = activate(&p, 2);
        let p = activate(&p, 0);
        assert_eq!(p.solved_order, vec![2, 0]);
    }

    #[test]
    fn system_solves_when_order_matches_witness() {
        let mut world = World::new();
        world.register_component::<Puzzle>("puzzle");

        let mut p = puzzle(vec![2, 0, 1]);
        p.solved_order = vec![2, 0, 1];
        let mut bundle = seedfall_ecs::world::ComponentBundle::new();
        bundle.add(world.registry(), p);
        let entity = world.spawn_bundle(bundle);

        let mut commands = CommandBuffer::new();
        system(&world, &mut commands);
        commands.apply(&mut world);

        assert_eq!(world.get_component::<Puzzle>(entity).unwrap().state, PuzzleRuntimeState::Solved);
    }

    #[test]
    fn system_leaves_permuted_order_unsolved() {
        let mut world = World::new();
        world.register_component::<Puzzle>("puzzle");

        let mut p = puzzle(vec![2, 0, 1]);
        p.solved_order = vec![0, 2, 1];
        let mut bundle = seedfall_ecs::world::ComponentBundle::new();
        bundle.add(world.registry(), p);
        let entity = world.spawn_bundle(bundle);

        let mut commands = CommandBuffer::new();
        system(&world, &mut commands);
        commands.apply(&mut world);

        assert_eq!(world.get_component::<Puzzle>(entity).unwrap().state, PuzzleRuntimeState::Unsolved);
    }
}
