//! A red tile that grows from the top-left corner until it fills the
//! matrix, then shrinks back, one step every half second.
//!
//! Run: cargo run --bin growing

use std::time::Duration;

use log::debug;
use neotiles_core::{
    FrameRate, ManagerConfig, PixelColor, SolidTile, TileHandle, TilePosition, TileSize,
};
use neotiles_demos::{COLUMNS, DemoResult, ROWS, open_terminal};

fn run() -> DemoResult {
    let manager = open_terminal(ManagerConfig::default().with_frame_rate(FrameRate::PerSecond(10.0)))?;

    let tile = TileHandle::new(SolidTile).with_default_color(PixelColor::rgb(255, 0, 0));
    let id = manager.register_tile(&tile, TileSize::UNIT, TilePosition::ORIGIN)?;
    manager.start()?;

    let limit = COLUMNS.min(ROWS);
    let mut growing = true;
    neotiles_demos::run_until_quit(&manager, Duration::from_millis(500), || {
        let side = tile.size().columns();
        if growing && side >= limit {
            growing = false;
        } else if !growing && side <= 1 {
            growing = true;
        }
        let side = if growing { side + 1 } else { side - 1 };
        debug!("tile {id} is now {side}x{side}");
        manager.resize_tile(id, TileSize::new(side, side)?)?;
        Ok(())
    })
}

fn main() {
    neotiles_demos::init_logging();
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
