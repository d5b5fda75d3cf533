#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays scripted Grid Chase sessions.

mod config;
mod render;
mod scatter;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use grid_chase_core::{AgentKind, GridCoord};
use grid_chase_world::query;
use tracing_subscriber::EnvFilter;

use crate::{config::ScenarioConfig, session::Session};

/// Plays a two-agent chase on a square grid, one move intent per turn.
#[derive(Debug, Parser)]
#[command(name = "grid-chase", version)]
struct Args {
    /// Scenario TOML file describing the grid, obstacles and agents.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Move intent for the controlled agent as a one-based `column,row` tile label. Repeatable.
    #[arg(long = "intent", value_parser = render::parse_tile_label)]
    intents: Vec<GridCoord>,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Upper bound on ticks spent in a single turn pair.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,

    /// Replaces the obstacle layout with random obstacles at this density.
    #[arg(long, value_parser = scatter::parse_density)]
    scatter: Option<f64>,

    /// Seed for `--scatter`.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Prints the board after every turn.
    #[arg(long)]
    render: bool,

    /// Log filter directives; overrides `RUST_LOG`.
    #[arg(long)]
    log: Option<String>,
}

/// Entry point for the Grid Chase command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref())?;

    let config = match &args.config {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };
    let mut setup = config.into_setup()?;
    if let Some(density) = args.scatter {
        let keep = [setup.controlled.start, setup.ai.start];
        setup.obstacles = scatter::scatter_obstacles(&setup.grid, density, args.seed, &keep);
        tracing::info!(
            density,
            seed = args.seed,
            blocked = setup.obstacles.blocked_count(),
            "scattered obstacles"
        );
    }

    let mut session = Session::new(setup, Duration::from_millis(args.tick_ms), args.max_ticks)?;
    if args.render {
        print!("{}", render::render_board(session.world()));
    }

    for (turn, target) in (1_usize..).zip(args.intents) {
        println!("turn {turn}: intent {}", render::tile_label(target));
        if let Err(error) = session.submit(target) {
            tracing::warn!(%target, %error, "move intent rejected");
            println!("  rejected: {error}");
            continue;
        }

        let report = session
            .run_turn()
            .with_context(|| format!("turn {turn} did not complete"))?;
        for line in report.events.iter().filter_map(render::describe) {
            println!("  {line}");
        }
        println!("  completed in {} ticks", report.ticks);
        if args.render {
            print!("{}", render::render_board(session.world()));
        }
    }

    for agent in AgentKind::ALL {
        println!(
            "{}",
            render::describe_agent(
                agent,
                query::agent_cell(session.world(), agent),
                query::agent_position(session.world(), agent),
            )
        );
    }

    Ok(())
}

fn init_logging(directives: Option<&str>) -> Result<()> {
    let filter = match directives {
        Some(directives) => {
            EnvFilter::try_new(directives).context("invalid --log filter directives")?
        }
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
