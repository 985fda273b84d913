//! Two fires side by side: a red one burning up from the bottom and a green
//! one burning down from the top.
//!
//! Run: cargo run --bin fire

use std::time::Duration;

use neotiles_core::{FrameRate, ManagerConfig, TileHandle, TilePosition, TileSize};
use neotiles_demos::{COLUMNS, DemoResult, FireBase, FireTile, ROWS, open_terminal};

/// Larger values give shorter flames.
const DIVISOR: f32 = 7.2;

fn run() -> DemoResult {
    let manager = open_terminal(ManagerConfig::default().with_frame_rate(FrameRate::PerSecond(10.0)))?;

    let width = COLUMNS / 2;
    let size = TileSize::new(width, ROWS)?;
    let red = TileHandle::new(FireTile::new(DIVISOR, 0, FireBase::Bottom)).with_animate(true);
    let green = TileHandle::new(FireTile::new(DIVISOR, 50, FireBase::Top)).with_animate(true);
    manager.register_tile(&red, size, TilePosition::ORIGIN)?;
    manager.register_tile(&green, size, TilePosition::new(width, 0)?)?;
    manager.start()?;

    neotiles_demos::run_until_quit(&manager, Duration::from_millis(500), || Ok(()))
}

fn main() {
    neotiles_demos::init_logging();
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
