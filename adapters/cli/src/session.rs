//! Headless driver pumping commands between the world and the turn system.

use std::{collections::VecDeque, time::Duration};

use anyhow::{bail, Context, Result};
use grid_chase_core::{Command, Event, GridCoord, TurnState};
use grid_chase_system_turns::{IntentError, TurnCoordinator};
use grid_chase_world::{self as world, query, World, WorldSetup};

/// Owns the world and the turn coordinator for a single play session.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    coordinator: TurnCoordinator,
    tick: Duration,
    max_ticks: u64,
    pending: Vec<Command>,
}

/// Everything observed while a turn pair played out.
#[derive(Debug, Default)]
pub(crate) struct TurnReport {
    /// Ticks applied before control returned to the controlled agent.
    pub(crate) ticks: u64,
    /// Events broadcast by the world, in order.
    pub(crate) events: Vec<Event>,
}

impl Session {
    /// Creates a session from validated starting conditions.
    pub(crate) fn new(setup: WorldSetup, tick: Duration, max_ticks: u64) -> Result<Self> {
        let world = World::new(setup).context("invalid starting conditions")?;
        Ok(Self {
            world,
            coordinator: TurnCoordinator::new(),
            tick,
            max_ticks,
            pending: Vec::new(),
        })
    }

    /// Read-only access to the world.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Hands a move intent for the controlled agent to the turn coordinator.
    pub(crate) fn submit(&mut self, target: GridCoord) -> Result<(), IntentError> {
        let occupancy = query::occupancy(&self.world);
        self.coordinator
            .submit_intent(target, &occupancy, &mut self.pending)
    }

    /// Ticks the world until both agents moved and the turn is back with the
    /// controlled agent.
    pub(crate) fn run_turn(&mut self) -> Result<TurnReport> {
        let mut report = TurnReport::default();
        let commands = std::mem::take(&mut self.pending);
        self.dispatch(commands, &mut report.events)?;

        while !self.is_idle() {
            if report.ticks >= self.max_ticks {
                bail!(
                    "turn did not complete within {} ticks (now {:?})",
                    self.max_ticks,
                    self.coordinator.turn()
                );
            }
            report.ticks += 1;
            self.dispatch(vec![Command::Tick { dt: self.tick }], &mut report.events)?;
        }

        Ok(report)
    }

    fn is_idle(&self) -> bool {
        self.coordinator.turn() == TurnState::ControlledTurn
            && !self.coordinator.awaiting_completion()
    }

    fn dispatch(&mut self, commands: Vec<Command>, log: &mut Vec<Event>) -> Result<()> {
        let mut queue: VecDeque<Command> = commands.into();
        while let Some(command) = queue.pop_front() {
            let mut events = Vec::new();
            if let Err(error) = world::apply(&mut self.world, command.clone(), &mut events) {
                self.coordinator.abort_pending();
                return Err(error).with_context(|| format!("world rejected {command:?}"));
            }

            let mut follow_up = Vec::new();
            self.coordinator
                .handle(&events, &query::occupancy(&self.world), &mut follow_up);
            log.extend(events);
            queue.extend(follow_up);
        }
        Ok(())
    }
}
