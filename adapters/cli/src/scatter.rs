//! Seeded random obstacle layouts.

use grid_chase_core::{GridCoord, GridSpace, ObstacleMap};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Blocks each tile with probability `density`, leaving the `keep` tiles open.
///
/// Identical seeds always produce identical layouts.
pub(crate) fn scatter_obstacles(
    grid: &GridSpace,
    density: f64,
    seed: u64,
    keep: &[GridCoord],
) -> ObstacleMap {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let blocked: Vec<GridCoord> = grid
        .cells()
        .filter(|cell| {
            let roll = rng.gen_bool(density.clamp(0.0, 1.0));
            roll && !keep.contains(cell)
        })
        .collect();

    ObstacleMap::with_blocked(grid, blocked).unwrap_or_else(|_| ObstacleMap::empty(grid))
}

/// Parses an obstacle density in `[0, 1]` from the command line.
pub(crate) fn parse_density(value: &str) -> Result<f64, String> {
    let density: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    if !(0.0..=1.0).contains(&density) {
        return Err(format!("density must lie within [0, 1], got {density}"));
    }
    Ok(density)
}
