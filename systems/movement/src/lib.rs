#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Constant-speed waypoint follower that owns an agent's continuous position.
//!
//! One world unit spans one tile and tile `(c, r)` sits at position `(c, r)`.
//! The agent's discrete tile is the truncation of its continuous position.

use std::{collections::VecDeque, time::Duration};

use glam::Vec2;
use grid_chase_core::GridCoord;

/// Travel speed, in tiles per second, used when none is configured.
pub const DEFAULT_SPEED: f32 = 5.0;

/// Remaining distance below which an agent snaps onto its waypoint.
pub const ARRIVAL_EPSILON: f32 = 0.01;

/// Lifecycle of a [`MovementExecutor`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No route is active.
    #[default]
    Idle,
    /// A route is being drained.
    Traversing,
}

/// Outcome of a single [`MovementExecutor::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Advance {
    /// The executor had no active route; nothing moved.
    Idle,
    /// The agent moved but has not yet reached its current waypoint.
    StillMoving,
    /// The agent snapped onto the provided waypoint.
    Arrived(GridCoord),
    /// The route is exhausted; the executor returned to idle.
    Finished,
}

/// Drives one agent along a queue of waypoints.
#[derive(Clone, Debug)]
pub struct MovementExecutor {
    position: Vec2,
    speed: f32,
    waypoints: VecDeque<GridCoord>,
    phase: Phase,
}

impl MovementExecutor {
    /// Creates an idle executor resting on `start`.
    pub fn new(start: GridCoord, speed: f32) -> Result<Self, MovementError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(MovementError::InvalidSpeed { speed });
        }

        Ok(Self {
            position: tile_position(start),
            speed,
            waypoints: VecDeque::new(),
            phase: Phase::Idle,
        })
    }

    /// Continuous position of the agent in world units.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Tile currently occupied by the agent.
    #[must_use]
    pub fn cell(&self) -> GridCoord {
        GridCoord::new(self.position.x as u32, self.position.y as u32)
    }

    /// Travel speed in tiles per second.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reports whether a route is being drained.
    #[must_use]
    pub fn is_traversing(&self) -> bool {
        self.phase == Phase::Traversing
    }

    /// Number of waypoints not yet reached.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.waypoints.len()
    }

    /// Final waypoint of the active route, if any remain.
    #[must_use]
    pub fn destination(&self) -> Option<GridCoord> {
        self.waypoints.back().copied()
    }

    /// Starts draining `waypoints`, which must exclude the agent's current tile.
    ///
    /// Every waypoint must be one orthogonal step from its predecessor, the
    /// first one from the agent's current tile.
    pub fn begin(&mut self, waypoints: Vec<GridCoord>) -> Result<(), MovementError> {
        if self.is_traversing() {
            return Err(MovementError::AlreadyMoving);
        }
        if waypoints.is_empty() {
            return Err(InvalidRoute::Empty.into());
        }

        let mut previous = self.cell();
        for &waypoint in &waypoints {
            if !previous.is_adjacent(waypoint) {
                return Err(InvalidRoute::Disjoint {
                    from: previous,
                    to: waypoint,
                }
                .into());
            }
            previous = waypoint;
        }

        self.waypoints = waypoints.into();
        self.phase = Phase::Traversing;
        Ok(())
    }

    /// Moves toward the head waypoint for `dt` of simulated time.
    pub fn advance(&mut self, dt: Duration) -> Advance {
        if self.phase == Phase::Idle {
            return Advance::Idle;
        }

        let Some(target) = self.waypoints.front().copied() else {
            self.phase = Phase::Idle;
            return Advance::Finished;
        };

        let destination = tile_position(target);
        let max_step = self.speed * dt.as_secs_f32();
        self.position = move_towards(self.position, destination, max_step);

        if self.position.distance(destination) < ARRIVAL_EPSILON {
            self.position = destination;
            let _ = self.waypoints.pop_front();
            return Advance::Arrived(target);
        }

        Advance::StillMoving
    }
}

/// Continuous position of the provided tile.
#[must_use]
pub fn tile_position(cell: GridCoord) -> Vec2 {
    Vec2::new(cell.column() as f32, cell.row() as f32)
}

fn move_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance == 0.0 {
        return target;
    }
    current + delta / distance * max_step
}

/// Contract violations raised by [`MovementExecutor`].
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum MovementError {
    /// A route was supplied while another one is still being drained.
    #[error("agent is already following a route")]
    AlreadyMoving,
    /// The supplied waypoints do not form a traversable route.
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] InvalidRoute),
    /// The configured speed is not a positive finite number.
    #[error("movement speed must be positive and finite, got {speed}")]
    InvalidSpeed {
        /// Rejected speed value.
        speed: f32,
    },
}

/// Reasons a waypoint list cannot be followed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRoute {
    /// No waypoints remained after dropping the start tile.
    #[error("route holds no waypoints beyond the start tile")]
    Empty,
    /// Two consecutive tiles are not one orthogonal step apart.
    #[error("step from {from} to {to} is not a single orthogonal move")]
    Disjoint {
        /// Tile the step departs from.
        from: GridCoord,
        /// Tile the step tries to reach.
        to: GridCoord,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_towards_never_overshoots() {
        let current = Vec2::new(0.0, 0.0);
        let target = Vec2::new(1.0, 0.0);
        assert_eq!(move_towards(current, target, 0.25), Vec2::new(0.25, 0.0));
        assert_eq!(move_towards(current, target, 3.0), target);
        assert_eq!(move_towards(target, target, 0.5), target);
    }

    #[test]
    fn truncation_maps_position_to_cell() {
        let mut executor = MovementExecutor::new(GridCoord::new(2, 3), 1.0).expect("speed");
        assert_eq!(executor.cell(), GridCoord::new(2, 3));

        executor
            .begin(vec![GridCoord::new(3, 3)])
            .expect("adjacent waypoint");
        assert_eq!(
            executor.advance(Duration::from_millis(600)),
            Advance::StillMoving
        );
        assert_eq!(executor.cell(), GridCoord::new(2, 3));
        assert!((executor.position().x - 2.6).abs() < 1e-5);
    }

    #[test]
    fn rejects_non_positive_speed() {
        assert_eq!(
            MovementExecutor::new(GridCoord::new(0, 0), 0.0).err(),
            Some(MovementError::InvalidSpeed { speed: 0.0 })
        );
        assert!(MovementExecutor::new(GridCoord::new(0, 0), f32::NAN).is_err());
    }

    #[test]
    fn idle_executor_reports_idle() {
        let mut executor =
            MovementExecutor::new(GridCoord::new(0, 0), DEFAULT_SPEED).expect("speed");
        assert_eq!(executor.advance(Duration::from_secs(1)), Advance::Idle);
        assert_eq!(executor.position(), Vec2::ZERO);
    }
}
