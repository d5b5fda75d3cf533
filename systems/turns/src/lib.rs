#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn coordination system alternating movement between the two agents.
//!
//! The coordinator never touches agent state directly. It validates move
//! intents against an [`OccupancyOracle`], plans routes with a
//! [`PathFinder`], and answers with [`Command`] batches. Turn ownership only
//! changes when the world reports [`Event::MovementFinished`] for the agent
//! that owns the current turn.

use grid_chase_core::{AgentKind, Command, Event, GridCoord, OccupancyOracle, TurnState};
use grid_chase_system_pathfinding::{PathError, PathFinder};

/// State machine deciding which agent may move and issuing its move orders.
#[derive(Debug, Default)]
pub struct TurnCoordinator {
    turn: TurnState,
    pathfinder: PathFinder,
    awaiting: bool,
}

impl TurnCoordinator {
    /// Creates a coordinator that hands the first turn to the controlled agent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Agent turn currently in progress.
    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.turn
    }

    /// Reports whether a move order was issued and its completion is pending.
    #[must_use]
    pub fn awaiting_completion(&self) -> bool {
        self.awaiting
    }

    /// Validates a move intent for the controlled agent and emits its route.
    ///
    /// A rejected intent leaves the coordinator untouched and emits nothing.
    /// The turn does not change until the route finishes.
    pub fn submit_intent(
        &mut self,
        target: GridCoord,
        occupancy: &OccupancyOracle<'_>,
        out: &mut Vec<Command>,
    ) -> Result<(), IntentError> {
        if self.turn != TurnState::ControlledTurn {
            return Err(IntentError::NotControlledTurn);
        }
        if self.awaiting {
            return Err(IntentError::MoveInProgress);
        }

        let grid = occupancy.grid();
        if !grid.contains(target) {
            return Err(IntentError::OutOfBounds { target });
        }
        let start = occupancy.agent_cell(AgentKind::Controlled);
        if target == start {
            return Err(IntentError::OwnTile { target });
        }
        if occupancy.is_blocked_destination(target, AgentKind::Controlled) {
            return Err(IntentError::Blocked { target });
        }

        let route = match self.pathfinder.find_path(grid, start, target, |cell| {
            occupancy.is_blocked(cell, AgentKind::Controlled)
        }) {
            Ok(route) => route,
            Err(PathError::OutOfBounds(_)) => return Err(IntentError::OutOfBounds { target }),
            Err(PathError::NotFound { .. }) => return Err(IntentError::Unreachable { target }),
        };

        tracing::debug!(%start, %target, waypoints = route.len(), "move intent accepted");
        self.awaiting = true;
        out.push(Command::FollowPath {
            agent: AgentKind::Controlled,
            waypoints: route.into_steps(),
        });
        Ok(())
    }

    /// Drops the pending controlled move order after the world refused it.
    ///
    /// The controlled agent may then submit a fresh intent. An AI order is
    /// never dropped; the AI turn only ends through its completion.
    pub fn abort_pending(&mut self) {
        if self.turn == TurnState::ControlledTurn && self.awaiting {
            tracing::debug!("pending controlled move order dropped");
            self.awaiting = false;
        }
    }

    /// Consumes world events, flipping the turn when its owner finishes moving.
    ///
    /// Only completions of an order this coordinator issued count. Entering
    /// the AI turn immediately emits the AI's move order, using the occupancy
    /// captured after the events were produced.
    pub fn handle(
        &mut self,
        events: &[Event],
        occupancy: &OccupancyOracle<'_>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::MovementFinished { agent } = event else {
                continue;
            };

            let owner = self.turn.owner();
            if *agent != owner {
                tracing::warn!(%agent, %owner, "ignoring completion from agent without the turn");
                continue;
            }
            if !self.awaiting {
                tracing::warn!(%agent, "ignoring completion without a pending move order");
                continue;
            }

            self.turn = self.turn.next();
            self.awaiting = false;
            tracing::debug!(finished = %agent, next = %self.turn.owner(), "turn passed");

            if self.turn == TurnState::AiTurn {
                out.push(self.ai_move_order(occupancy));
                self.awaiting = true;
            }
        }
    }

    fn ai_move_order(&mut self, occupancy: &OccupancyOracle<'_>) -> Command {
        let grid = occupancy.grid();
        let ai = occupancy.agent_cell(AgentKind::Ai);
        let quarry = occupancy.agent_cell(AgentKind::Controlled);

        for candidate in grid.neighbors4(quarry) {
            if candidate == ai || occupancy.is_blocked(candidate, AgentKind::Ai) {
                continue;
            }

            let Ok(route) = self.pathfinder.find_path(grid, ai, candidate, |cell| {
                occupancy.is_blocked(cell, AgentKind::Ai)
            }) else {
                tracing::trace!(%candidate, "chase candidate unreachable");
                continue;
            };
            if route.len() <= 1 {
                continue;
            }

            tracing::debug!(from = %ai, to = %candidate, waypoints = route.len(), "ai chasing");
            return Command::FollowPath {
                agent: AgentKind::Ai,
                waypoints: route.into_steps(),
            };
        }

        tracing::debug!(%ai, %quarry, "ai has no usable chase route, holding position");
        Command::HoldPosition {
            agent: AgentKind::Ai,
        }
    }
}

/// Reasons a controlled-agent move intent was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IntentError {
    /// The AI agent currently owns the turn.
    #[error("move intents are only accepted on the controlled agent's turn")]
    NotControlledTurn,
    /// A move intent was already accepted this turn.
    #[error("the controlled agent is already moving")]
    MoveInProgress,
    /// The target lies outside the grid.
    #[error("target {target} lies outside the grid")]
    OutOfBounds {
        /// Rejected target tile.
        target: GridCoord,
    },
    /// The target is the controlled agent's own tile.
    #[error("target {target} is the agent's own tile")]
    OwnTile {
        /// Rejected target tile.
        target: GridCoord,
    },
    /// The target is an obstacle or occupied by the AI agent.
    #[error("target {target} is blocked")]
    Blocked {
        /// Rejected target tile.
        target: GridCoord,
    },
    /// No route leads to the target.
    #[error("no route reaches {target}")]
    Unreachable {
        /// Rejected target tile.
        target: GridCoord,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_chase_core::{GridSpace, ObstacleMap};

    #[test]
    fn intent_emits_route_without_start_tile() {
        let grid = GridSpace::new(3).expect("grid");
        let obstacles = ObstacleMap::empty(&grid);
        let oracle =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(0, 0), GridCoord::new(2, 2));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        coordinator
            .submit_intent(GridCoord::new(2, 0), &oracle, &mut out)
            .expect("intent accepted");

        assert_eq!(
            out,
            vec![Command::FollowPath {
                agent: AgentKind::Controlled,
                waypoints: vec![GridCoord::new(1, 0), GridCoord::new(2, 0)],
            }]
        );
        assert!(coordinator.awaiting_completion());
        assert_eq!(coordinator.turn(), TurnState::ControlledTurn);
    }

    #[test]
    fn second_intent_is_rejected_while_moving() {
        let grid = GridSpace::new(3).expect("grid");
        let obstacles = ObstacleMap::empty(&grid);
        let oracle =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(0, 0), GridCoord::new(2, 2));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        coordinator
            .submit_intent(GridCoord::new(1, 0), &oracle, &mut out)
            .expect("first intent");
        out.clear();
        assert_eq!(
            coordinator.submit_intent(GridCoord::new(0, 1), &oracle, &mut out),
            Err(IntentError::MoveInProgress)
        );
        assert!(out.is_empty());
    }

    #[test]
    fn rejected_intents_emit_nothing() {
        let grid = GridSpace::new(3).expect("grid");
        let obstacles = ObstacleMap::from_rows(&["...", ".##", ".#."]).expect("layout");
        let oracle =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(0, 0), GridCoord::new(2, 0));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        let cases = [
            (GridCoord::new(3, 0), IntentError::OutOfBounds { target: GridCoord::new(3, 0) }),
            (GridCoord::new(0, 0), IntentError::OwnTile { target: GridCoord::new(0, 0) }),
            (GridCoord::new(1, 1), IntentError::Blocked { target: GridCoord::new(1, 1) }),
            (GridCoord::new(2, 0), IntentError::Blocked { target: GridCoord::new(2, 0) }),
            (GridCoord::new(2, 2), IntentError::Unreachable { target: GridCoord::new(2, 2) }),
        ];
        for (target, expected) in cases {
            assert_eq!(
                coordinator.submit_intent(target, &oracle, &mut out),
                Err(expected)
            );
        }
        assert!(out.is_empty());
        assert!(!coordinator.awaiting_completion());
    }

    #[test]
    fn aborted_order_accepts_a_fresh_intent() {
        let grid = GridSpace::new(3).expect("grid");
        let obstacles = ObstacleMap::empty(&grid);
        let oracle =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(0, 0), GridCoord::new(2, 2));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        coordinator
            .submit_intent(GridCoord::new(1, 0), &oracle, &mut out)
            .expect("first intent");
        coordinator.abort_pending();
        assert!(!coordinator.awaiting_completion());
        assert_eq!(coordinator.turn(), TurnState::ControlledTurn);

        out.clear();
        coordinator
            .submit_intent(GridCoord::new(0, 1), &oracle, &mut out)
            .expect("fresh intent after abort");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn ai_order_is_never_aborted() {
        let grid = GridSpace::new(3).expect("grid");
        let obstacles = ObstacleMap::empty(&grid);
        let before =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(0, 0), GridCoord::new(2, 2));
        let after =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(1, 0), GridCoord::new(2, 2));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        coordinator
            .submit_intent(GridCoord::new(1, 0), &before, &mut out)
            .expect("intent accepted");
        coordinator.handle(
            &[Event::MovementFinished {
                agent: AgentKind::Controlled,
            }],
            &after,
            &mut out,
        );
        coordinator.abort_pending();

        assert_eq!(coordinator.turn(), TurnState::AiTurn);
        assert!(coordinator.awaiting_completion());
    }

    #[test]
    fn completion_from_non_owner_is_ignored() {
        let grid = GridSpace::new(3).expect("grid");
        let obstacles = ObstacleMap::empty(&grid);
        let oracle =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(0, 0), GridCoord::new(2, 2));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        coordinator.handle(
            &[Event::MovementFinished {
                agent: AgentKind::Ai,
            }],
            &oracle,
            &mut out,
        );

        assert_eq!(coordinator.turn(), TurnState::ControlledTurn);
        assert!(out.is_empty());
    }

    #[test]
    fn ai_order_skips_candidates_it_cannot_use() {
        let grid = GridSpace::new(4).expect("grid");
        let obstacles = ObstacleMap::from_rows(&["....", "....", "#...", "...."]).expect("layout");
        let before =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(1, 1), GridCoord::new(2, 2));
        // Controlled lands on (1, 2): +x (2, 2) is the AI, -x (0, 2) is an obstacle.
        let after =
            OccupancyOracle::new(&grid, &obstacles, GridCoord::new(1, 2), GridCoord::new(2, 2));
        let mut coordinator = TurnCoordinator::new();
        let mut out = Vec::new();

        coordinator
            .submit_intent(GridCoord::new(1, 2), &before, &mut out)
            .expect("intent accepted");
        out.clear();
        coordinator.handle(
            &[Event::MovementFinished {
                agent: AgentKind::Controlled,
            }],
            &after,
            &mut out,
        );

        assert_eq!(coordinator.turn(), TurnState::AiTurn);
        assert_eq!(
            out,
            vec![Command::FollowPath {
                agent: AgentKind::Ai,
                waypoints: vec![GridCoord::new(2, 3), GridCoord::new(1, 3)],
            }]
        );
    }
}
