//! Headless rotating-stage level runner.
//!
//! Provides three modes of operation:
//! - `run`: simulate a level for N ticks with scripted input and print the outcome
//! - `check`: validate a level file and print what it would spawn
//! - `nav`: populate a level and dump its navigation graph as JSON

use std::path::{Path, PathBuf};

use anyhow::Context;
use bevy_app::App;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec2;
use heist_core::HeistCorePlugin;
use heist_core::config::LevelConfig;
use heist_core::time::TickClock;
use heist_core::types::RotationDirection;
use heist_level::prelude::*;
use heist_nav::NavGraph;
use heist_physics::HeistPhysicsPlugin;
use heist_physics::rapier::RapierContext;
use heist_stage::RotationEngine;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Rotating-stage platformer simulation core.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a level and print the outcome.
    Run {
        /// Level TOML file; the built-in defaults when omitted.
        #[arg(short, long)]
        level: Option<PathBuf>,

        /// Number of ticks to simulate.
        #[arg(short, long, default_value_t = 600)]
        ticks: u32,

        /// Held horizontal input in [-1, 1].
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        axis: f32,

        /// Press rotate every K ticks.
        #[arg(short, long)]
        rotate_every: Option<u32>,

        /// Direction of scripted rotate presses.
        #[arg(short, long, value_enum, default_value_t = Turn::Cw)]
        direction: Turn,
    },

    /// Validate a level file.
    Check {
        #[arg(short, long)]
        level: PathBuf,
    },

    /// Dump the level's navigation graph as JSON.
    Nav {
        #[arg(short, long)]
        level: PathBuf,

        /// Pretty-print the JSON.
        #[arg(short, long)]
        pretty: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Turn {
    Cw,
    Ccw,
}

impl From<Turn> for RotationDirection {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::Cw => Self::Clockwise,
            Turn::Ccw => Self::CounterClockwise,
        }
    }
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load(path: Option<&Path>) -> anyhow::Result<LevelConfig> {
    match path {
        Some(path) => LevelConfig::from_file(path)
            .with_context(|| format!("loading level {}", path.display())),
        None => Ok(LevelConfig::default()),
    }
}

fn build_app(config: LevelConfig) -> anyhow::Result<App> {
    let mut app = App::new();
    app.add_plugins(HeistCorePlugin);
    app.add_plugins(HeistPhysicsPlugin::new(RapierContext::new(Vec2::ZERO)));
    app.add_plugins(HeistLevelPlugin::new(config));
    app.finish();
    app.cleanup();
    reset_level(app.world_mut()).context("populating level")?;
    Ok(app)
}

fn run_level(
    level: Option<&Path>,
    ticks: u32,
    axis: f32,
    rotate_every: Option<u32>,
    direction: RotationDirection,
) -> anyhow::Result<()> {
    let mut app = build_app(load(level)?)?;
    let mut rotations = 0_u32;
    let mut sounds = Vec::new();

    for tick in 1..=ticks {
        {
            let mut input = app.world_mut().resource_mut::<InputState>();
            input.set_axis(axis);
            if rotate_every.is_some_and(|k| k > 0 && tick % k == 0) {
                input.press_rotate(direction);
            }
        }
        let was_rotating = app.world().resource::<RotationEngine>().is_rotating();
        app.update();
        if !was_rotating && app.world().resource::<RotationEngine>().is_rotating() {
            rotations += 1;
        }
        sounds.extend(app.world_mut().resource_mut::<SoundQueue>().drain());
        if app.world().resource::<LevelStatus>().is_over() {
            break;
        }
    }

    let status = *app.world().resource::<LevelStatus>();
    let clock = app.world().resource::<TickClock>();
    let outcome = if status.is_complete() {
        "complete"
    } else if status.is_failed() {
        "failed"
    } else {
        "running"
    };
    println!(
        "outcome={outcome} ticks={} elapsed={:.3}s rotations={rotations} sounds={}",
        clock.tick(),
        clock.elapsed_secs(),
        sounds.len()
    );
    let pose = avatar_pose(app.world_mut())?;
    println!(
        "avatar: x={:.3} y={:.3} angle={:.3}",
        pose.position.x, pose.position.y, pose.angle
    );
    Ok(())
}

fn run_check(level: &Path) -> anyhow::Result<()> {
    let config = load(Some(level))?;
    println!("{}: ok", level.display());
    println!(
        "walls={} platforms={} agents={} pivot=({:.2}, {:.2})",
        config.walls.len(),
        config.platforms.polygons.len(),
        config.agents.len(),
        config.pivot().x,
        config.pivot().y
    );
    Ok(())
}

fn run_nav(level: &Path, pretty: bool) -> anyhow::Result<()> {
    let app = build_app(load(Some(level))?)?;
    let snapshot = app.world().resource::<NavGraph>().snapshot();
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            level,
            ticks,
            axis,
            rotate_every,
            direction,
        }) => run_level(level.as_deref(), ticks, axis, rotate_every, direction.into()),
        Some(Commands::Check { level }) => run_check(&level),
        Some(Commands::Nav { level, pretty }) => run_nav(&level, pretty),
        None => run_level(None, 600, 0.0, None, RotationDirection::Clockwise),
    }
}
