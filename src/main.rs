//! Matchtui — swap-and-match tile puzzle (three in a row) in the terminal.

mod app;
mod cascade;
mod game;
mod grid;
mod input;
mod lifecycle;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Engine timings and seed, derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Swap animation length; falls take 80% of it.
    pub animation_ms: u64,
    pub shake_ms: u64,
    /// Delay between successive refilled tiles in one column.
    pub refill_stagger_ms: u64,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            animation_ms: 1000,
            shake_ms: 500,
            refill_stagger_ms: 100,
            seed: None,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let theme = match theme::Theme::load(args.theme.as_deref()) {
        Ok(theme) => theme,
        Err(err) => {
            tracing::warn!(%err, "theme not loaded, using defaults");
            theme::Theme::default()
        }
    };
    let config = GameConfig {
        animation_ms: args.animation_ms,
        shake_ms: args.shake_ms,
        refill_stagger_ms: args.stagger_ms,
        seed: args.seed,
    };
    let mut app = App::new(&args, &config, theme);
    app.run()?;
    Ok(())
}

/// Log to a file; the terminal itself belongs to the game.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Swap-and-match tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matchtui",
    version,
    about = "Swap adjacent tiles to line up three or more of a kind.",
    long_about = "Matchtui is a terminal tile-matching puzzle on a 9x9 board.\n\n\
        Click a tile, then click a neighbour to swap them. A swap is only allowed if it \
        lines up three or more identical tiles in a row or column. Matched tiles are \
        removed (10 points each), the tiles above fall down and new ones drop in.\n\n\
        Stuck? The Shuffle button rearranges the board for 50 points. The game ends \
        when your score is 0, or when no swap is possible and you cannot afford a shuffle.\n\n\
        CONTROLS:\n  Mouse       Click tiles / Shuffle button\n  Arrows/hjkl Move cursor   \
        Enter/Space Press tile under cursor\n  S           Shuffle       R          Restart (game over)\n  \
        Q / Esc     Quit"
)]
pub struct Args {
    /// Swap animation duration in ms (tile falls take 80% of it).
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub animation_ms: u64,

    /// Shake duration in ms after a rejected swap.
    #[arg(long, default_value = "500", value_name = "MS")]
    pub shake_ms: u64,

    /// Delay in ms between new tiles dropping into the same column.
    #[arg(long, default_value = "100", value_name = "MS")]
    pub stagger_ms: u64,

    /// Seed for tile generation (same seed, same boards).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses built-in colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Target frames per second (one game tick per frame).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,
}
