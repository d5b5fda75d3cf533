#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Grid Chase.

use std::time::Duration;

use grid_chase_core::{AgentKind, Command, Event, GridCoord, GridError, GridSpace, ObstacleMap};
use grid_chase_system_movement::{Advance, MovementError, MovementExecutor, DEFAULT_SPEED};

/// Starting conditions for a single agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSetup {
    /// Tile the agent occupies when the session starts.
    pub start: GridCoord,
    /// Travel speed in tiles per second.
    pub speed: f32,
}

impl AgentSetup {
    /// Places an agent on `start` with the default travel speed.
    #[must_use]
    pub const fn at(start: GridCoord) -> Self {
        Self {
            start,
            speed: DEFAULT_SPEED,
        }
    }

    /// Overrides the travel speed.
    #[must_use]
    pub const fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Everything required to construct a [`World`].
#[derive(Clone, Debug, PartialEq)]
pub struct WorldSetup {
    /// Bounds of the play area.
    pub grid: GridSpace,
    /// Permanently blocked tiles; must be sized for `grid`.
    pub obstacles: ObstacleMap,
    /// Starting conditions of the controlled agent.
    pub controlled: AgentSetup,
    /// Starting conditions of the AI agent.
    pub ai: AgentSetup,
}

/// Represents the authoritative Grid Chase world state.
#[derive(Debug)]
pub struct World {
    grid: GridSpace,
    obstacles: ObstacleMap,
    controlled: MovementExecutor,
    ai: MovementExecutor,
    tick_index: u64,
}

impl World {
    /// Creates a world from validated starting conditions.
    pub fn new(setup: WorldSetup) -> Result<Self, WorldError> {
        let WorldSetup {
            grid,
            obstacles,
            controlled,
            ai,
        } = setup;

        if !obstacles.matches(&grid) {
            return Err(GridError::SizeMismatch {
                expected: grid.cell_count(),
                actual: obstacles.cells().len(),
            }
            .into());
        }

        let starts = [
            (AgentKind::Controlled, controlled.start),
            (AgentKind::Ai, ai.start),
        ];
        for (agent, start) in starts {
            grid.check(start)?;
            if obstacles.is_blocked(start) {
                return Err(WorldError::StartBlocked { agent, cell: start });
            }
        }
        if controlled.start == ai.start {
            return Err(WorldError::SharedStart {
                cell: controlled.start,
            });
        }

        Ok(Self {
            controlled: spawn_executor(AgentKind::Controlled, controlled)?,
            ai: spawn_executor(AgentKind::Ai, ai)?,
            grid,
            obstacles,
            tick_index: 0,
        })
    }

    fn executor(&self, agent: AgentKind) -> &MovementExecutor {
        match agent {
            AgentKind::Controlled => &self.controlled,
            AgentKind::Ai => &self.ai,
        }
    }

    fn executor_mut(&mut self, agent: AgentKind) -> &mut MovementExecutor {
        match agent {
            AgentKind::Controlled => &mut self.controlled,
            AgentKind::Ai => &mut self.ai,
        }
    }

    fn advance_agents(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for agent in AgentKind::ALL {
            let executor = self.executor_mut(agent);
            if !executor.is_traversing() {
                continue;
            }

            match executor.advance(dt) {
                Advance::Idle | Advance::StillMoving => {}
                Advance::Arrived(cell) => {
                    tracing::trace!(%agent, %cell, "waypoint reached");
                    out_events.push(Event::AgentArrived { agent, cell });
                }
                Advance::Finished => {
                    tracing::debug!(%agent, cell = %executor.cell(), "movement finished");
                    out_events.push(Event::MovementFinished { agent });
                }
            }
        }
    }
}

fn spawn_executor(agent: AgentKind, setup: AgentSetup) -> Result<MovementExecutor, WorldError> {
    MovementExecutor::new(setup.start, setup.speed)
        .map_err(|source| WorldError::Movement { agent, source })
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// A command that fails leaves the world untouched and emits no events.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance_agents(dt, out_events);
        }
        Command::FollowPath { agent, waypoints } => {
            for waypoint in &waypoints {
                world.grid.check(*waypoint)?;
            }
            let destination = waypoints.last().copied();
            let count = waypoints.len();

            world
                .executor_mut(agent)
                .begin(waypoints)
                .map_err(|source| WorldError::Movement { agent, source })?;

            if let Some(destination) = destination {
                tracing::debug!(%agent, %destination, waypoints = count, "route started");
                out_events.push(Event::RouteStarted {
                    agent,
                    destination,
                    waypoints: count,
                });
            }
        }
        Command::HoldPosition { agent } => {
            if world.executor(agent).is_traversing() {
                return Err(WorldError::Movement {
                    agent,
                    source: MovementError::AlreadyMoving,
                });
            }
            tracing::debug!(%agent, "holding position");
            out_events.push(Event::MovementFinished { agent });
        }
    }

    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use grid_chase_core::{AgentKind, GridCoord, GridSpace, ObstacleMap, OccupancyOracle};

    use super::World;

    /// Provides read-only access to the world's grid bounds.
    #[must_use]
    pub fn grid(world: &World) -> &GridSpace {
        &world.grid
    }

    /// Provides read-only access to the permanent obstacle map.
    #[must_use]
    pub fn obstacles(world: &World) -> &ObstacleMap {
        &world.obstacles
    }

    /// Number of ticks applied since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Tile currently occupied by the requested agent.
    #[must_use]
    pub fn agent_cell(world: &World, agent: AgentKind) -> GridCoord {
        world.executor(agent).cell()
    }

    /// Continuous position of the requested agent, for presentation.
    #[must_use]
    pub fn agent_position(world: &World, agent: AgentKind) -> Vec2 {
        world.executor(agent).position()
    }

    /// Reports whether the requested agent is following a route.
    #[must_use]
    pub fn is_moving(world: &World, agent: AgentKind) -> bool {
        world.executor(agent).is_traversing()
    }

    /// Captures an occupancy oracle reflecting both agents' current tiles.
    #[must_use]
    pub fn occupancy(world: &World) -> OccupancyOracle<'_> {
        OccupancyOracle::new(
            &world.grid,
            &world.obstacles,
            agent_cell(world, AgentKind::Controlled),
            agent_cell(world, AgentKind::Ai),
        )
    }

    /// Captures a read-only view of both agents.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        let snapshots = AgentKind::ALL
            .into_iter()
            .map(|agent| {
                let executor = world.executor(agent);
                AgentSnapshot {
                    agent,
                    cell: executor.cell(),
                    position: executor.position(),
                    moving: executor.is_traversing(),
                    remaining: executor.remaining(),
                }
            })
            .collect();
        AgentView { snapshots }
    }

    /// Read-only snapshot describing both agents.
    #[derive(Clone, Debug)]
    pub struct AgentView {
        snapshots: Vec<AgentSnapshot>,
    }

    impl AgentView {
        /// Iterator over the captured snapshots, controlled agent first.
        pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AgentSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single agent's state used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct AgentSnapshot {
        /// Agent the snapshot describes.
        pub agent: AgentKind,
        /// Tile currently occupied by the agent.
        pub cell: GridCoord,
        /// Continuous position in world units.
        pub position: Vec2,
        /// Indicates whether the agent is following a route.
        pub moving: bool,
        /// Number of waypoints not yet reached.
        pub remaining: usize,
    }
}

/// Failures raised while constructing or mutating the world.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// A coordinate or obstacle table violated the grid contract.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// An agent was configured to start on a permanent obstacle.
    #[error("{agent} agent cannot start on obstacle tile {cell}")]
    StartBlocked {
        /// Agent whose start tile is blocked.
        agent: AgentKind,
        /// Offending start tile.
        cell: GridCoord,
    },
    /// Both agents were configured to start on the same tile.
    #[error("agents cannot share start tile {cell}")]
    SharedStart {
        /// Tile claimed by both agents.
        cell: GridCoord,
    },
    /// An agent's movement executor rejected the request.
    #[error("{agent} agent movement rejected: {source}")]
    Movement {
        /// Agent whose executor rejected the request.
        agent: AgentKind,
        /// Underlying executor failure.
        source: MovementError,
    },
}
