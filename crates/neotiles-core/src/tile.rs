//! Tiles: the [`Tile`] behavior trait, the opaque [`TileData`] fed to tiles,
//! and [`TileHandle`], the shared wrapper that owns a tile's pixel buffer and
//! flags.
//!
//! Implement [`Tile`] to decide what a tile looks like. Wrap it in a
//! [`TileHandle`] to configure its default color and flags, then hand the
//! handle to [`TileManager::register_tile`](crate::TileManager::register_tile),
//! which gives the tile its final size. Keep a clone of the handle to feed the
//! tile data or inspect its pixels later.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::canvas::Canvas;
use crate::color::PixelColor;
use crate::error::TileFault;
use crate::geom::{PixelPosition, TileSize};
use crate::manager::TileId;

// ---------------------------------------------------------------------------
// TileData
// ---------------------------------------------------------------------------

/// Arbitrary application data delivered to tiles.
///
/// Cloning is cheap; the same value is shared by every tile it is sent to.
#[derive(Clone)]
pub struct TileData(Arc<dyn Any + Send + Sync>);

impl TileData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the payload as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Whether both values share the same payload allocation.
    pub fn ptr_eq(&self, other: &TileData) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TileData(..)")
    }
}

// ---------------------------------------------------------------------------
// Tile trait
// ---------------------------------------------------------------------------

/// Per-tile drawing logic.
///
/// Hooks run with the tile's lock held. They must not call back into the
/// manager that owns the tile, or into the tile's own [`TileHandle`].
pub trait Tile: Send {
    /// Paint the tile's canvas.
    ///
    /// `data` is the data most recently delivered to the tile, or `None` if
    /// nothing has been delivered yet. The scheduler calls this on every
    /// tick for animated tiles, passing the same buffered data again.
    fn draw(&mut self, canvas: &mut Canvas, data: Option<&TileData>) -> Result<(), TileFault>;

    /// Called each time the tile is given a size, after its canvas has been
    /// reallocated. Use it to size any internal state.
    fn on_size_set(&mut self, _size: TileSize) {}

    /// Called when new data arrives, before the redraw.
    fn on_data(&mut self, _data: &TileData) -> Result<(), TileFault> {
        Ok(())
    }
}

/// A tile that paints its default color on every redraw.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolidTile;

impl Tile for SolidTile {
    fn draw(&mut self, canvas: &mut Canvas, _data: Option<&TileData>) -> Result<(), TileFault> {
        canvas.reset();
        Ok(())
    }
}

/// A tile whose redraw is a closure. See [`from_fn`].
pub struct FnTile<F>(F);

/// Build a tile from a draw closure.
pub fn from_fn<F>(f: F) -> FnTile<F>
where
    F: FnMut(&mut Canvas, Option<&TileData>) -> Result<(), TileFault> + Send,
{
    FnTile(f)
}

impl<F> Tile for FnTile<F>
where
    F: FnMut(&mut Canvas, Option<&TileData>) -> Result<(), TileFault> + Send,
{
    fn draw(&mut self, canvas: &mut Canvas, data: Option<&TileData>) -> Result<(), TileFault> {
        (self.0)(canvas, data)
    }
}

// ---------------------------------------------------------------------------
// TileSlot
// ---------------------------------------------------------------------------

/// Everything behind a tile's lock.
pub(crate) struct TileSlot {
    tile: Box<dyn Tile>,
    canvas: Canvas,
    data: Option<TileData>,
    animate: bool,
    accepting_data: bool,
    visible: bool,
    registration: Option<TileId>,
}

impl TileSlot {
    /// Store `data` and redraw with it.
    pub(crate) fn deliver(&mut self, data: TileData) -> Result<(), TileFault> {
        let data = self.data.insert(data);
        self.tile.on_data(data)?;
        self.redraw()
    }

    /// Redraw with the buffered data.
    pub(crate) fn redraw(&mut self) -> Result<(), TileFault> {
        self.tile.draw(&mut self.canvas, self.data.as_ref())
    }

    /// Reallocate the canvas for `size` and notify the tile.
    pub(crate) fn apply_size(&mut self, size: TileSize) {
        self.canvas.resize(size);
        self.tile.on_size_set(size);
    }

    pub(crate) fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub(crate) fn animate(&self) -> bool {
        self.animate
    }

    pub(crate) fn accepting_data(&self) -> bool {
        self.accepting_data
    }

    pub(crate) fn visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn registration(&self) -> Option<TileId> {
        self.registration
    }

    pub(crate) fn set_registration(&mut self, id: Option<TileId>) {
        self.registration = id;
    }
}

// ---------------------------------------------------------------------------
// TileHandle
// ---------------------------------------------------------------------------

/// A shareable handle to a tile and its pixel buffer.
///
/// Clones refer to the same tile. All access goes through one lock per tile,
/// so a tile is never redrawn by two threads at once and the compositor never
/// reads a half-drawn buffer.
///
/// A new handle has size 1x1, default color off, animation off, and accepts
/// data. A handle can be registered with at most one manager at a time.
#[derive(Clone)]
pub struct TileHandle {
    slot: Arc<Mutex<TileSlot>>,
}

impl TileHandle {
    pub fn new<T: Tile + 'static>(tile: T) -> Self {
        Self::from_box(Box::new(tile))
    }

    pub fn from_box(tile: Box<dyn Tile>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(TileSlot {
                tile,
                canvas: Canvas::new(TileSize::UNIT, PixelColor::OFF),
                data: None,
                animate: false,
                accepting_data: true,
                visible: true,
                registration: None,
            })),
        }
    }

    /// Lock the slot. A tile that panicked mid-draw poisons its lock; the
    /// buffer is still structurally valid, so keep going with it.
    pub(crate) fn lock(&self) -> MutexGuard<'_, TileSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the default color and repaint the canvas with it (builder).
    pub fn with_default_color(self, color: PixelColor) -> Self {
        {
            let mut slot = self.lock();
            slot.canvas.set_default_color(color);
            slot.canvas.reset();
        }
        self
    }

    /// Set the animate flag (builder).
    pub fn with_animate(self, animate: bool) -> Self {
        self.set_animate(animate);
        self
    }

    /// Set the accepting-data flag (builder).
    pub fn with_accepting_data(self, accepting: bool) -> Self {
        self.set_accepting_data(accepting);
        self
    }

    /// Set the visible flag (builder).
    pub fn with_visible(self, visible: bool) -> Self {
        self.set_visible(visible);
        self
    }

    /// Whether both handles refer to the same tile.
    pub fn ptr_eq(&self, other: &TileHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// The id this tile is registered under, if any.
    pub fn id(&self) -> Option<TileId> {
        self.lock().registration
    }

    pub fn size(&self) -> TileSize {
        self.lock().canvas.size()
    }

    pub fn default_color(&self) -> PixelColor {
        self.lock().canvas.default_color()
    }

    /// Change the default color. The canvas is not repainted until the next
    /// redraw or [`reset`](TileHandle::reset).
    pub fn set_default_color(&self, color: PixelColor) {
        self.lock().canvas.set_default_color(color);
    }

    /// Whether the scheduler redraws this tile on every tick.
    pub fn animate(&self) -> bool {
        self.lock().animate
    }

    pub fn set_animate(&self, animate: bool) {
        self.lock().animate = animate;
    }

    /// Whether broadcast data and [`set_data`](TileHandle::set_data) reach
    /// this tile.
    pub fn is_accepting_data(&self) -> bool {
        self.lock().accepting_data
    }

    pub fn set_accepting_data(&self, accepting: bool) {
        self.lock().accepting_data = accepting;
    }

    /// Whether the compositor draws this tile.
    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    /// The data most recently delivered to the tile.
    pub fn data(&self) -> Option<TileData> {
        self.lock().data.clone()
    }

    /// Store `data` on the tile without redrawing. Ignored (returns `false`)
    /// when the tile is not accepting data.
    pub fn set_data(&self, data: TileData) -> bool {
        let mut slot = self.lock();
        if !slot.accepting_data {
            return false;
        }
        slot.data = Some(data);
        true
    }

    /// Redraw the tile now with its buffered data.
    pub fn draw(&self) -> Result<(), TileFault> {
        self.lock().redraw()
    }

    /// Set every pixel to off.
    pub fn clear(&self) {
        self.lock().canvas.clear();
    }

    /// Set every pixel to the default color.
    pub fn reset(&self) {
        self.lock().canvas.reset();
    }

    /// The color of one pixel.
    pub fn pixel(&self, p: impl Into<PixelPosition>) -> Option<PixelColor> {
        self.lock().canvas.at(p)
    }

    /// The tile's pixels, one `Vec` per row.
    pub fn pixels(&self) -> Vec<Vec<PixelColor>> {
        self.lock().canvas.to_rows()
    }

    /// A copy of the tile's canvas.
    pub fn snapshot(&self) -> Canvas {
        self.lock().canvas.clone()
    }
}

impl fmt::Debug for TileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.lock();
        f.debug_struct("TileHandle")
            .field("id", &slot.registration)
            .field("size", &slot.canvas.size())
            .field("default_color", &slot.canvas.default_color())
            .field("animate", &slot.animate)
            .field("accepting_data", &slot.accepting_data)
            .field("visible", &slot.visible)
            .finish()
    }
}
