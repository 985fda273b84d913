//! **neotiles-core**: tile manager for addressable LED matrices.
//!
//! A matrix is split into rectangular tiles. Each tile draws into its own
//! local canvas; the [`TileManager`] composites the canvases at their
//! registered positions and flushes the result to a [`HardwareMatrix`],
//! either on demand or from a background animation thread.
//!
//! ```
//! use neotiles_core::{
//!     MatrixSize, PixelColor, SolidTile, TileHandle, TileManager, TilePosition, TileSize,
//!     VirtualMatrix,
//! };
//!
//! let manager = TileManager::new(VirtualMatrix::new(MatrixSize::new(8, 8)?));
//! let red = TileHandle::new(SolidTile).with_default_color(PixelColor::rgb(128, 0, 0));
//! manager.register_tile(&red, TileSize::new(4, 4)?, TilePosition::ORIGIN)?;
//! manager.draw_hardware_matrix()?;
//! assert_eq!(
//!     manager.with_matrix(|m| m.pixel(3, 3)),
//!     Some(PixelColor::rgb(128, 0, 0))
//! );
//! # Ok::<(), neotiles_core::TileError>(())
//! ```

pub mod canvas;
pub mod color;
pub mod compositor;
pub mod error;
pub mod geom;
pub mod manager;
pub mod matrix;
pub mod scheduler;
pub mod tile;

pub use canvas::Canvas;
pub use color::PixelColor;
pub use compositor::{Frame, composite};
pub use error::{HardwareError, TileError, TileFault};
pub use geom::{MatrixSize, PixelPosition, Point, Range, TilePosition, TileSize};
pub use manager::{
    DispatchReport, FaultEvent, ManagerConfig, OverlapPolicy, TileId, TileManager, TilePlacement,
};
pub use matrix::{HardwareMatrix, VirtualMatrix};
pub use scheduler::{Clock, Context, FrameRate, SchedulerState, SystemClock};
pub use tile::{FnTile, SolidTile, Tile, TileData, TileHandle, from_fn};
