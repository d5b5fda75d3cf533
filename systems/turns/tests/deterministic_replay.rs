use std::{
    collections::{hash_map::DefaultHasher, VecDeque},
    hash::{Hash, Hasher},
    time::Duration,
};

use grid_chase_core::{AgentKind, Command, Event, GridCoord, GridSpace, ObstacleMap, TurnState};
use grid_chase_system_turns::TurnCoordinator;
use grid_chase_world::{self as world, query, AgentSetup, World, WorldSetup};

#[test]
fn deterministic_replay_produces_identical_event_logs() {
    let first = replay(scripted_intents());
    let second = replay(scripted_intents());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.rejected, 1, "the blocked intent must be refused");
    assert_eq!(first.final_cells.0, GridCoord::new(6, 6));
    assert!(first.final_cells.1.is_adjacent(first.final_cells.0));
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<Event>,
    rejected: usize,
    final_cells: (GridCoord, GridCoord),
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.events.hash(&mut hasher);
        self.rejected.hash(&mut hasher);
        self.final_cells.hash(&mut hasher);
        hasher.finish()
    }
}

fn scripted_intents() -> Vec<GridCoord> {
    vec![
        GridCoord::new(6, 0),
        GridCoord::new(3, 3),
        GridCoord::new(0, 6),
        GridCoord::new(6, 6),
    ]
}

fn replay(intents: Vec<GridCoord>) -> ReplayOutcome {
    let obstacles = ObstacleMap::from_rows(&[
        ".......", //
        ".##.##.", //
        ".#...#.", //
        "...#...", //
        ".#...#.", //
        ".##.##.", //
        ".......",
    ])
    .expect("layout");
    let grid = GridSpace::new(obstacles.size()).expect("grid");
    let mut world = World::new(WorldSetup {
        grid,
        obstacles,
        controlled: AgentSetup::at(GridCoord::new(0, 0)),
        ai: AgentSetup::at(GridCoord::new(6, 6)).with_speed(3.0),
    })
    .expect("valid setup");
    let mut coordinator = TurnCoordinator::new();
    let mut events = Vec::new();
    let mut rejected = 0;

    for target in intents {
        let mut commands = Vec::new();
        if coordinator
            .submit_intent(target, &query::occupancy(&world), &mut commands)
            .is_err()
        {
            rejected += 1;
            continue;
        }

        let mut frames = 0;
        loop {
            let mut pending: VecDeque<Command> = commands.drain(..).collect();
            while let Some(command) = pending.pop_front() {
                let mut generated = Vec::new();
                world::apply(&mut world, command, &mut generated).expect("command accepted");
                let mut follow_up = Vec::new();
                coordinator.handle(&generated, &query::occupancy(&world), &mut follow_up);
                events.extend(generated);
                pending.extend(follow_up);
            }

            if coordinator.turn() == TurnState::ControlledTurn
                && !coordinator.awaiting_completion()
            {
                break;
            }
            frames += 1;
            assert!(frames < 10_000, "turn never completed");
            commands.push(Command::Tick {
                dt: Duration::from_millis(16),
            });
        }
    }

    ReplayOutcome {
        events,
        rejected,
        final_cells: (
            query::agent_cell(&world, AgentKind::Controlled),
            query::agent_cell(&world, AgentKind::Ai),
        ),
    }
}
