//! Scenario files describing the grid, its obstacles and both agents.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use grid_chase_core::{GridCoord, GridSpace, ObstacleMap, DEFAULT_GRID_SIZE};
use grid_chase_world::{AgentSetup, WorldSetup};
use serde::Deserialize;

/// Scenario parsed from a TOML file. Coordinates are zero-based.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    /// Tiles along each edge; defaults to the obstacle layout size or 10.
    #[serde(default)]
    grid_size: Option<u32>,
    /// Obstacle layout rows, row 0 first, using `#` and `.`.
    #[serde(default)]
    obstacles: Option<Vec<String>>,
    #[serde(default)]
    controlled: AgentConfig,
    #[serde(default)]
    ai: AgentConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct AgentConfig {
    #[serde(default)]
    start: Option<[u32; 2]>,
    #[serde(default)]
    speed: Option<f32>,
}

impl AgentConfig {
    fn resolve(&self, fallback: GridCoord) -> AgentSetup {
        let start = self
            .start
            .map_or(fallback, |[column, row]| GridCoord::new(column, row));
        let setup = AgentSetup::at(start);
        match self.speed {
            Some(speed) => setup.with_speed(speed),
            None => setup,
        }
    }
}

impl ScenarioConfig {
    /// Reads and parses the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario file {}", path.display()))
    }

    /// Parses scenario TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse scenario toml contents")
    }

    /// Resolves defaults and builds the world setup.
    ///
    /// The controlled agent defaults to the first tile and the AI agent to the
    /// last one. Placement conflicts are reported when the world is created.
    pub(crate) fn into_setup(self) -> Result<WorldSetup> {
        let layout_size = match &self.obstacles {
            Some(rows) => Some(u32::try_from(rows.len()).context("obstacle layout too large")?),
            None => None,
        };
        let size = match (self.grid_size, layout_size) {
            (Some(size), Some(rows)) if size != rows => {
                bail!("grid_size is {size} but the obstacle layout has {rows} rows")
            }
            (Some(size), _) => size,
            (None, Some(rows)) => rows,
            (None, None) => DEFAULT_GRID_SIZE,
        };

        let grid = GridSpace::new(size).context("invalid grid_size")?;
        let obstacles = match &self.obstacles {
            Some(rows) => {
                ObstacleMap::from_rows(rows.as_slice()).context("invalid obstacle layout")?
            }
            None => ObstacleMap::empty(&grid),
        };
        let far_corner = GridCoord::new(size - 1, size - 1);

        Ok(WorldSetup {
            grid,
            obstacles,
            controlled: self.controlled.resolve(GridCoord::new(0, 0)),
            ai: self.ai.resolve(far_corner),
        })
    }
}
