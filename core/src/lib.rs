#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Grid Chase engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems read the grid through
//! immutable views such as [`OccupancyOracle`] and respond exclusively with new
//! command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Side length of the square grid used when no configuration is supplied.
pub const DEFAULT_GRID_SIZE: u32 = 10;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Hands an agent the waypoints it should traverse, excluding its current tile.
    FollowPath {
        /// Agent that should start moving.
        agent: AgentKind,
        /// Ordered tiles to visit; the first entry neighbours the agent's tile.
        waypoints: Vec<GridCoord>,
    },
    /// Completes an agent's move order without any movement.
    HoldPosition {
        /// Agent that forfeits its movement.
        agent: AgentKind,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an agent accepted a route and began traversing it.
    RouteStarted {
        /// Agent that began moving.
        agent: AgentKind,
        /// Final tile of the accepted route.
        destination: GridCoord,
        /// Number of tiles the agent will step through.
        waypoints: usize,
    },
    /// Reports that an agent snapped onto one of its route waypoints.
    AgentArrived {
        /// Agent that reached the waypoint.
        agent: AgentKind,
        /// Tile the agent now occupies.
        cell: GridCoord,
    },
    /// Reports that an agent exhausted its route, or held position.
    MovementFinished {
        /// Agent whose move order completed.
        agent: AgentKind,
    },
}

/// Identifies one of the two agents sharing the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    /// Agent steered by external move intents.
    Controlled,
    /// Agent that chases the controlled agent on its own turn.
    Ai,
}

impl AgentKind {
    /// Both agents in the deterministic order used for iteration.
    pub const ALL: [AgentKind; 2] = [AgentKind::Controlled, AgentKind::Ai];

    /// Returns the agent opposing this one.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Controlled => Self::Ai,
            Self::Ai => Self::Controlled,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controlled => f.write_str("controlled"),
            Self::Ai => f.write_str("ai"),
        }
    }
}

/// Identifies which agent currently owns the turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// The controlled agent may accept one move intent.
    #[default]
    ControlledTurn,
    /// The AI agent is executing its chase order.
    AiTurn,
}

impl TurnState {
    /// Agent that owns this turn.
    #[must_use]
    pub const fn owner(self) -> AgentKind {
        match self {
            Self::ControlledTurn => AgentKind::Controlled,
            Self::AiTurn => AgentKind::Ai,
        }
    }

    /// Turn that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::ControlledTurn => Self::AiTurn,
            Self::AiTurn => Self::ControlledTurn,
        }
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    column: u32,
    row: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Reports whether `other` is exactly one orthogonal step away.
    #[must_use]
    pub fn is_adjacent(self, other: GridCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Bounds of the square play area.
///
/// Immutable once constructed; every coordinate handed to the engine must
/// satisfy `0 <= column, row < size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct GridSpace {
    size: u32,
}

impl TryFrom<u32> for GridSpace {
    type Error = GridError;

    fn try_from(size: u32) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl From<GridSpace> for u32 {
    fn from(grid: GridSpace) -> Self {
        grid.size
    }
}

impl GridSpace {
    /// Creates a grid with `size` tiles along each edge.
    pub fn new(size: u32) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::EmptyGrid);
        }
        Ok(Self { size })
    }

    /// Number of tiles along each edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Total number of tiles in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let side = usize::try_from(self.size).unwrap_or(0);
        side.saturating_mul(side)
    }

    /// Reports whether the coordinate lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: GridCoord) -> bool {
        cell.column < self.size && cell.row < self.size
    }

    /// Fails with [`GridError::OutOfBounds`] when the coordinate lies outside the grid.
    pub fn check(&self, cell: GridCoord) -> Result<(), GridError> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                cell,
                size: self.size,
            })
        }
    }

    /// Row-major offset of the coordinate, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: GridCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let row = usize::try_from(cell.row).ok()?;
        let column = usize::try_from(cell.column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Coordinate stored at the provided row-major offset.
    #[must_use]
    pub fn coord_at(&self, index: usize) -> Option<GridCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let width = usize::try_from(self.size).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(GridCoord::new(column, row))
    }

    /// Orthogonal neighbours of `cell` that lie within the grid.
    ///
    /// Neighbours are always produced in the order +x, −x, +y, −y. Search
    /// tie-breaking depends on this order, so it must never change.
    #[must_use]
    pub fn neighbors4(&self, cell: GridCoord) -> Neighbors {
        let mut neighbors = Neighbors::default();

        if let Some(column) = cell.column.checked_add(1) {
            neighbors.push_within(self, GridCoord::new(column, cell.row));
        }
        if let Some(column) = cell.column.checked_sub(1) {
            neighbors.push_within(self, GridCoord::new(column, cell.row));
        }
        if let Some(row) = cell.row.checked_add(1) {
            neighbors.push_within(self, GridCoord::new(cell.column, row));
        }
        if let Some(row) = cell.row.checked_sub(1) {
            neighbors.push_within(self, GridCoord::new(cell.column, row));
        }

        neighbors
    }

    /// Iterator over every coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |column| GridCoord::new(column, row)))
    }
}

/// Fixed-capacity iterator over the orthogonal neighbours of a tile.
#[derive(Clone, Debug, Default)]
pub struct Neighbors {
    buffer: [Option<GridCoord>; 4],
    len: usize,
    cursor: usize,
}

impl Neighbors {
    fn push_within(&mut self, grid: &GridSpace, cell: GridCoord) {
        if grid.contains(cell) && self.len < self.buffer.len() {
            self.buffer[self.len] = Some(cell);
            self.len += 1;
        }
    }
}

impl Iterator for Neighbors {
    type Item = GridCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}

/// Permanently blocked tiles, stored row-major with one flag per tile.
///
/// Supplied once by the obstacle data provider before play begins and never
/// mutated by the engine afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObstacleMap {
    size: u32,
    blocked: Vec<bool>,
}

impl ObstacleMap {
    /// Glyph marking a blocked tile in textual layouts.
    pub const BLOCKED_GLYPH: char = '#';
    /// Glyph marking an open tile in textual layouts.
    pub const OPEN_GLYPH: char = '.';

    /// Creates a map sized for `grid` with no obstacles.
    #[must_use]
    pub fn empty(grid: &GridSpace) -> Self {
        Self {
            size: grid.size(),
            blocked: vec![false; grid.cell_count()],
        }
    }

    /// Wraps a row-major table of flags, which must hold one entry per tile.
    pub fn from_cells(grid: &GridSpace, blocked: Vec<bool>) -> Result<Self, GridError> {
        if blocked.len() != grid.cell_count() {
            return Err(GridError::SizeMismatch {
                expected: grid.cell_count(),
                actual: blocked.len(),
            });
        }
        Ok(Self {
            size: grid.size(),
            blocked,
        })
    }

    /// Creates a map sized for `grid` with the listed tiles blocked.
    pub fn with_blocked<I>(grid: &GridSpace, cells: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = GridCoord>,
    {
        let mut map = Self::empty(grid);
        for cell in cells {
            let index = grid.index(cell).ok_or(GridError::OutOfBounds {
                cell,
                size: grid.size(),
            })?;
            map.blocked[index] = true;
        }
        Ok(map)
    }

    /// Parses a square textual layout, row 0 first, using `#` and `.` glyphs.
    pub fn from_rows<S>(rows: &[S]) -> Result<Self, GridError>
    where
        S: AsRef<str>,
    {
        let size = u32::try_from(rows.len()).map_err(|_| GridError::InvalidLayout {
            row: 0,
            reason: "too many rows".to_owned(),
        })?;
        let grid = GridSpace::new(size)?;
        let mut blocked = Vec::with_capacity(grid.cell_count());

        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref().trim();
            if row.chars().count() != rows.len() {
                return Err(GridError::InvalidLayout {
                    row: index,
                    reason: format!("expected {} tiles, found {}", rows.len(), row.chars().count()),
                });
            }
            for glyph in row.chars() {
                match glyph {
                    Self::BLOCKED_GLYPH => blocked.push(true),
                    Self::OPEN_GLYPH => blocked.push(false),
                    other => {
                        return Err(GridError::InvalidLayout {
                            row: index,
                            reason: format!("unexpected glyph `{other}`"),
                        })
                    }
                }
            }
        }

        Self::from_cells(&grid, blocked)
    }

    /// Number of tiles along each edge of the map.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Reports whether the map was built for the provided grid.
    #[must_use]
    pub fn matches(&self, grid: &GridSpace) -> bool {
        self.size == grid.size() && self.blocked.len() == grid.cell_count()
    }

    /// Reports whether the tile is permanently blocked. Tiles off the map count as blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: GridCoord) -> bool {
        if cell.column >= self.size || cell.row >= self.size {
            return true;
        }
        let Ok(width) = usize::try_from(self.size) else {
            return true;
        };
        let Ok(row) = usize::try_from(cell.row) else {
            return true;
        };
        let Ok(column) = usize::try_from(cell.column) else {
            return true;
        };
        self.blocked
            .get(row * width + column)
            .copied()
            .unwrap_or(true)
    }

    /// Number of permanently blocked tiles.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|blocked| **blocked).count()
    }

    /// Textual layout of the map, row 0 first, using the `#` and `.` glyphs.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        let width = usize::try_from(self.size).unwrap_or(0).max(1);
        self.blocked
            .chunks(width)
            .map(|row| {
                row.iter()
                    .map(|blocked| {
                        if *blocked {
                            Self::BLOCKED_GLYPH
                        } else {
                            Self::OPEN_GLYPH
                        }
                    })
                    .collect::<String>()
            })
            .collect()
    }

    /// Row-major flags backing the map.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.blocked
    }
}

/// Ordered tiles from a start tile to a goal tile, both inclusive.
///
/// A route always holds at least its start tile. Routes are produced once per
/// move order and consumed once; the start tile must be dropped via
/// [`Route::into_steps`] before handing the remainder to a mover.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    start: GridCoord,
    steps: Vec<GridCoord>,
}

impl Route {
    /// Creates a route from its start tile and the tiles that follow it.
    #[must_use]
    pub fn new(start: GridCoord, steps: Vec<GridCoord>) -> Self {
        Self { start, steps }
    }

    /// Tile the route departs from.
    #[must_use]
    pub const fn start(&self) -> GridCoord {
        self.start
    }

    /// Tile the route ends on.
    #[must_use]
    pub fn goal(&self) -> GridCoord {
        self.steps.last().copied().unwrap_or(self.start)
    }

    /// Number of waypoints including the start tile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len() + 1
    }

    /// Reports whether the route never leaves its start tile.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        self.steps.is_empty()
    }

    /// All waypoints, start tile first.
    #[must_use]
    pub fn waypoints(&self) -> Vec<GridCoord> {
        std::iter::once(self.start)
            .chain(self.steps.iter().copied())
            .collect()
    }

    /// Consumes the route, yielding the waypoints after the start tile.
    #[must_use]
    pub fn into_steps(self) -> Vec<GridCoord> {
        self.steps
    }
}

/// Read-only answer to "is this tile blocked" for the current tick.
///
/// Combines the permanent obstacle map with the discrete tiles of both agents
/// as they stood when the oracle was captured. Capture a fresh oracle for every
/// search; never reuse one across ticks.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyOracle<'a> {
    grid: &'a GridSpace,
    obstacles: &'a ObstacleMap,
    controlled: GridCoord,
    ai: GridCoord,
}

impl<'a> OccupancyOracle<'a> {
    /// Captures a new oracle from the obstacle map and both agents' tiles.
    #[must_use]
    pub const fn new(
        grid: &'a GridSpace,
        obstacles: &'a ObstacleMap,
        controlled: GridCoord,
        ai: GridCoord,
    ) -> Self {
        Self {
            grid,
            obstacles,
            controlled,
            ai,
        }
    }

    /// Grid the oracle answers for.
    #[must_use]
    pub const fn grid(&self) -> &'a GridSpace {
        self.grid
    }

    /// Tile occupied by the requested agent when the oracle was captured.
    #[must_use]
    pub const fn agent_cell(&self, agent: AgentKind) -> GridCoord {
        match agent {
            AgentKind::Controlled => self.controlled,
            AgentKind::Ai => self.ai,
        }
    }

    /// Reports whether `querying` may not traverse the tile.
    ///
    /// A tile is blocked when it lies off the grid, is a permanent obstacle,
    /// or is occupied by the other agent. The querying agent's own tile stays
    /// traversable so it can serve as a search start.
    #[must_use]
    pub fn is_blocked(&self, cell: GridCoord, querying: AgentKind) -> bool {
        !self.grid.contains(cell)
            || self.obstacles.is_blocked(cell)
            || cell == self.agent_cell(querying.opponent())
    }

    /// Reports whether `querying` may not choose the tile as a move target.
    ///
    /// Same as [`OccupancyOracle::is_blocked`], except that the controlled
    /// agent's own tile is also blocked so a click on it is refused.
    #[must_use]
    pub fn is_blocked_destination(&self, cell: GridCoord, querying: AgentKind) -> bool {
        self.is_blocked(cell, querying)
            || (querying == AgentKind::Controlled && cell == self.controlled)
    }
}

/// Failures raised when a coordinate or layout violates the grid contract.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The grid was configured with zero tiles per edge.
    #[error("grid size must be positive")]
    EmptyGrid,
    /// A coordinate lies outside `[0, size)` on at least one axis.
    #[error("tile {cell} lies outside the {size}x{size} grid")]
    OutOfBounds {
        /// Offending coordinate.
        cell: GridCoord,
        /// Edge length of the grid.
        size: u32,
    },
    /// The obstacle table does not hold one entry per grid tile.
    #[error("obstacle map holds {actual} tiles but the grid requires {expected}")]
    SizeMismatch {
        /// Tile count required by the grid.
        expected: usize,
        /// Tile count supplied by the obstacle table.
        actual: usize,
    },
    /// A textual obstacle layout could not be parsed.
    #[error("obstacle layout row {row} is invalid: {reason}")]
    InvalidLayout {
        /// Zero-based index of the offending row.
        row: usize,
        /// Human readable description of the problem.
        reason: String,
    },
}
