#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* search over the 4-connected grid.
//!
//! Every edge costs one step and the heuristic is the Manhattan distance to
//! the goal. Among open tiles with equal f-score the one discovered first is
//! expanded first, so identical inputs always yield identical routes.

use std::{cmp::Reverse, collections::BinaryHeap};

use grid_chase_core::{GridCoord, GridError, GridSpace, Route};

const UNSEEN: u32 = u32::MAX;

/// Reusable A* search workspace.
///
/// Scratch buffers are sized for the most recent grid and recycled between
/// searches. Occupancy is never cached: every call to
/// [`PathFinder::find_path`] consults the supplied predicate afresh.
#[derive(Debug, Default)]
pub struct PathFinder {
    g_scores: Vec<u32>,
    parents: Vec<Option<usize>>,
    closed: Vec<bool>,
    discovered: Vec<u32>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    expanded: usize,
}

impl PathFinder {
    /// Creates a pathfinder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tiles finalised by the most recent search.
    #[must_use]
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Searches for the shortest route from `start` to `goal`.
    ///
    /// `is_blocked` is evaluated for every candidate neighbour; the start
    /// tile itself is never tested. A blocked goal is never reached, so the
    /// search reports [`PathError::NotFound`] once the open set drains.
    pub fn find_path<F>(
        &mut self,
        grid: &GridSpace,
        start: GridCoord,
        goal: GridCoord,
        mut is_blocked: F,
    ) -> Result<Route, PathError>
    where
        F: FnMut(GridCoord) -> bool,
    {
        grid.check(start)?;
        grid.check(goal)?;
        self.prepare_workspace(grid.cell_count());

        let start_index = grid.index(start).ok_or(GridError::OutOfBounds {
            cell: start,
            size: grid.size(),
        })?;
        let mut next_discovery: u32 = 0;
        self.discover(start_index, 0, start.manhattan_distance(goal), &mut next_discovery);

        while let Some(Reverse(entry)) = self.open.pop() {
            if self.closed[entry.index] {
                continue;
            }
            let Some(current) = grid.coord_at(entry.index) else {
                continue;
            };

            if current == goal {
                let route = self.reconstruct(grid, start, entry.index);
                tracing::trace!(
                    %start,
                    %goal,
                    expanded = self.expanded,
                    waypoints = route.len(),
                    "route found"
                );
                return Ok(route);
            }

            self.closed[entry.index] = true;
            self.expanded += 1;
            let tentative = self.g_scores[entry.index].saturating_add(1);

            for neighbor in grid.neighbors4(current) {
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || is_blocked(neighbor) {
                    continue;
                }

                let recorded = self.g_scores[neighbor_index];
                if recorded != UNSEEN && tentative >= recorded {
                    continue;
                }

                self.parents[neighbor_index] = Some(entry.index);
                let f_score = tentative.saturating_add(neighbor.manhattan_distance(goal));
                if recorded == UNSEEN {
                    self.discover(neighbor_index, tentative, f_score, &mut next_discovery);
                } else {
                    self.g_scores[neighbor_index] = tentative;
                    self.open.push(Reverse(OpenEntry {
                        f_score,
                        discovered: self.discovered[neighbor_index],
                        index: neighbor_index,
                    }));
                }
            }
        }

        tracing::trace!(%start, %goal, expanded = self.expanded, "no route");
        Err(PathError::NotFound { start, goal })
    }

    fn prepare_workspace(&mut self, cell_count: usize) {
        if self.g_scores.len() != cell_count {
            self.g_scores = vec![UNSEEN; cell_count];
            self.parents = vec![None; cell_count];
            self.closed = vec![false; cell_count];
            self.discovered = vec![0; cell_count];
        } else {
            self.g_scores.fill(UNSEEN);
            self.parents.fill(None);
            self.closed.fill(false);
            self.discovered.fill(0);
        }
        self.open.clear();
        self.expanded = 0;
    }

    fn discover(&mut self, index: usize, g_score: u32, f_score: u32, next_discovery: &mut u32) {
        let discovered = *next_discovery;
        *next_discovery = next_discovery.saturating_add(1);
        self.g_scores[index] = g_score;
        self.discovered[index] = discovered;
        self.open.push(Reverse(OpenEntry {
            f_score,
            discovered,
            index,
        }));
    }

    fn reconstruct(&self, grid: &GridSpace, start: GridCoord, goal_index: usize) -> Route {
        let mut steps = Vec::new();
        let mut cursor = goal_index;
        while let Some(parent) = self.parents[cursor] {
            if let Some(cell) = grid.coord_at(cursor) {
                steps.push(cell);
            }
            cursor = parent;
        }
        steps.reverse();
        Route::new(start, steps)
    }
}

/// Open-set entry ordered by f-score, then by discovery order.
///
/// Superseded entries stay in the heap and are skipped once their tile closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f_score: u32,
    discovered: u32,
    index: usize,
}

/// Outcomes of a search that did not yield a route.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The start or goal lies outside the grid.
    #[error(transparent)]
    OutOfBounds(#[from] GridError),
    /// Every reachable tile was explored without reaching the goal.
    #[error("no route from {start} to {goal}")]
    NotFound {
        /// Tile the search departed from.
        start: GridCoord,
        /// Tile the search tried to reach.
        goal: GridCoord,
    },
}
