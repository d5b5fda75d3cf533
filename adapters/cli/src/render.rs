//! Plain-text presentation of the board and of world events.
//!
//! Tile labels are one-based, so the first tile reads `(1, 1)`.

use glam::Vec2;
use grid_chase_core::{AgentKind, Event, GridCoord};
use grid_chase_world::{query, World};

const CONTROLLED_GLYPH: char = 'P';
const AI_GLYPH: char = 'E';

/// One-based label shown for a tile.
pub(crate) fn tile_label(cell: GridCoord) -> String {
    format!(
        "({}, {})",
        u64::from(cell.column()) + 1,
        u64::from(cell.row()) + 1
    )
}

/// Converts a one-based `column,row` label into a grid coordinate.
pub(crate) fn parse_tile_label(value: &str) -> Result<GridCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let parse = |part: &str| -> Result<u32, String> {
        let label: u32 = part
            .trim()
            .parse()
            .map_err(|_| format!("`{}` is not a tile number", part.trim()))?;
        label
            .checked_sub(1)
            .ok_or_else(|| "tile numbers start at 1".to_owned())
    };
    Ok(GridCoord::new(parse(column)?, parse(row)?))
}

/// Renders the obstacle layout with both agents overlaid, row 0 first.
pub(crate) fn render_board(world: &World) -> String {
    let controlled = query::agent_cell(world, AgentKind::Controlled);
    let ai = query::agent_cell(world, AgentKind::Ai);
    let mut board = String::new();

    for (row, line) in (0_u32..).zip(query::obstacles(world).rows()) {
        for (column, glyph) in (0_u32..).zip(line.chars()) {
            let cell = GridCoord::new(column, row);
            board.push(if cell == controlled {
                CONTROLLED_GLYPH
            } else if cell == ai {
                AI_GLYPH
            } else {
                glyph
            });
        }
        board.push('\n');
    }

    board
}

/// Human readable line describing an event, if it is worth reporting.
pub(crate) fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimeAdvanced { .. } => None,
        Event::RouteStarted {
            agent,
            destination,
            waypoints,
        } => Some(format!(
            "{agent} heads for tile {} ({waypoints} steps)",
            tile_label(*destination)
        )),
        Event::AgentArrived { agent, cell } => {
            Some(format!("{agent} reached tile {}", tile_label(*cell)))
        }
        Event::MovementFinished { agent } => Some(format!("{agent} finished moving")),
    }
}

/// Summary line for an agent's resting place.
pub(crate) fn describe_agent(agent: AgentKind, cell: GridCoord, position: Vec2) -> String {
    format!(
        "{agent} on tile {} at ({:.2}, {:.2})",
        tile_label(cell),
        position.x,
        position.y
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_chase_core::{GridSpace, ObstacleMap};
    use grid_chase_world::{AgentSetup, WorldSetup};

    #[test]
    fn tile_labels_are_one_based() {
        assert_eq!(tile_label(GridCoord::new(0, 0)), "(1, 1)");
        assert_eq!(tile_label(GridCoord::new(9, 4)), "(10, 5)");
    }

    #[test]
    fn tile_label_parser_round_trips_labels() {
        assert_eq!(parse_tile_label("3,1"), Ok(GridCoord::new(2, 0)));
        assert_eq!(parse_tile_label(" 10 , 5 "), Ok(GridCoord::new(9, 4)));
        assert!(parse_tile_label("0,1").is_err());
        assert!(parse_tile_label("3").is_err());
        assert!(parse_tile_label("a,b").is_err());
    }

    #[test]
    fn board_overlays_agents_on_obstacles() {
        let obstacles = ObstacleMap::from_rows(&["..#", ".#.", "..."]).expect("layout");
        let grid = GridSpace::new(obstacles.size()).expect("grid");
        let world = World::new(WorldSetup {
            grid,
            obstacles,
            controlled: AgentSetup::at(GridCoord::new(0, 0)),
            ai: AgentSetup::at(GridCoord::new(2, 2)),
        })
        .expect("valid setup");

        assert_eq!(render_board(&world), "P.#\n.#.\n..E\n");
    }

    #[test]
    fn tick_events_are_not_described() {
        assert_eq!(
            describe(&Event::TimeAdvanced {
                dt: std::time::Duration::from_millis(16),
            }),
            None
        );
        assert_eq!(
            describe(&Event::AgentArrived {
                agent: AgentKind::Ai,
                cell: GridCoord::new(1, 0),
            })
            .as_deref(),
            Some("ai reached tile (2, 1)")
        );
    }
}
