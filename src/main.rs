use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use gridsnake::{config::GameConfig, game::SnakeGame, GridInt};

/// Snake on a fixed grid. Arrow keys or WASD to steer, Esc or q to quit.
#[derive(Parser)]
#[command(name = "gridsnake", version)]
struct Cli {
    /// Grid width in cells
    #[arg(long, default_value_t = 10)]
    width: GridInt,

    /// Grid height in cells
    #[arg(long, default_value_t = 10)]
    height: GridInt,

    /// Moves per second
    #[arg(long, default_value_t = 5)]
    tick_rate: u32,

    /// Crash into the edges instead of wrapping around
    #[arg(long)]
    no_wrap: bool,

    /// Tile edge length in terminal rows
    #[arg(long, default_value_t = 1)]
    tile_size: u16,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "snake.log")]
    log_file: String,

    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The screen belongs to the game, so logs go to a file
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("Error creating log file {}", cli.log_file))?;
    WriteLogger::init(level, Config::default(), log_file).context("Error initializing logger")?;

    let config = GameConfig {
        width: cli.width,
        height: cli.height,
        tick_rate: cli.tick_rate,
        wrap: !cli.no_wrap,
        tile_size: cli.tile_size,
        seed: cli.seed,
    };
    config.validate()?;
    info!("starting with {:?}", config);

    let mut game = SnakeGame::new(config)?;
    game.run()
}
