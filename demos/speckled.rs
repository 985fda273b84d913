//! Three speckled tiles that change color once a second. The top-left tile
//! is animated, so its speckles shimmer between color changes.
//!
//! Run: cargo run --bin speckled

use std::time::Duration;

use neotiles_core::{FrameRate, ManagerConfig, TileData, TileHandle, TilePosition, TileSize};
use neotiles_demos::{COLUMNS, DemoResult, ROWS, SpeckledTile, open_terminal, random_color};
use rand::seq::IndexedRandom;

fn run() -> DemoResult {
    let manager = open_terminal(ManagerConfig::default().with_frame_rate(FrameRate::PerSecond(10.0)))?;

    let (half_cols, half_rows) = (COLUMNS / 2, ROWS / 2);
    let tiles = [
        (
            TileHandle::new(SpeckledTile).with_animate(true),
            TileSize::new(half_cols, half_rows)?,
            TilePosition::ORIGIN,
        ),
        (
            TileHandle::new(SpeckledTile),
            TileSize::new(half_cols, half_rows)?,
            TilePosition::new(half_cols, 0)?,
        ),
        (
            TileHandle::new(SpeckledTile),
            TileSize::new(COLUMNS, half_rows)?,
            TilePosition::new(0, half_rows)?,
        ),
    ];
    let ids = tiles
        .iter()
        .map(|(tile, size, position)| manager.register_tile(tile, *size, *position))
        .collect::<Result<Vec<_>, _>>()?;
    manager.start()?;

    neotiles_demos::run_until_quit(&manager, Duration::from_secs(1), || {
        let brightness = [32u8, 64, 128, 192, 255]
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(u8::MAX);
        manager.set_brightness(brightness)?;

        // Each tile gets its own color, so feed them one by one rather than
        // broadcasting.
        for &id in &ids {
            manager.send_data_to_tile(id, TileData::new(random_color()))?;
        }
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
