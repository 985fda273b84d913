//! The [`TileManager`]: tile registry, data dispatch, compositing and the
//! animation scheduler.
//!
//! # Locking
//!
//! The registry and the hardware matrix share one lock, so registration never
//! interleaves with a composite-and-flush. Each tile has its own lock (see
//! [`TileHandle`]). The registry lock is always taken before a tile lock.
//! Data dispatch and the animated-redraw phase copy the registry, release it,
//! and then lock tiles one at a time, so a slow tile only delays itself.
//!
//! Tile code runs with its own lock held (and, for `on_size_set` and
//! compositing, the registry lock too). It must not call back into the
//! manager or into its own [`TileHandle`].

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};

use crate::color::PixelColor;
use crate::compositor::Frame;
use crate::error::{HardwareError, TileError, TileFault};
use crate::geom::{MatrixSize, Range, TilePosition, TileSize};
use crate::matrix::HardwareMatrix;
use crate::scheduler::{Animation, Clock, FrameRate, SchedulerState, SystemClock};
use crate::tile::{TileData, TileHandle};

// ---------------------------------------------------------------------------
// TileId
// ---------------------------------------------------------------------------

/// Identifies a registration. Ids are never reused by a manager.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileId(u64);

impl TileId {
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a placement overlaps an existing tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverlapPolicy {
    /// Overlap is allowed; the tile registered later is drawn on top.
    #[default]
    Allow,
    /// Overlapping placements fail with [`TileError::OverlapRejected`].
    Reject,
}

/// Manager settings.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ManagerConfig {
    pub overlap: OverlapPolicy,
    /// Color of pixels no visible tile covers.
    pub background: PixelColor,
    /// Rate used by [`TileManager::start`].
    pub frame_rate: FrameRate,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            overlap: OverlapPolicy::Allow,
            background: PixelColor::OFF,
            frame_rate: FrameRate::Manual,
        }
    }
}

impl ManagerConfig {
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_background(mut self, background: PixelColor) -> Self {
        self.background = background;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }
}

// ---------------------------------------------------------------------------
// Reports and events
// ---------------------------------------------------------------------------

/// Where a registered tile sits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilePlacement {
    pub id: TileId,
    pub position: TilePosition,
    pub size: TileSize,
}

impl TilePlacement {
    /// The global range the tile covers.
    pub fn range(&self) -> Range {
        self.position.placement(self.size)
    }
}

/// Outcome of a data dispatch or an animation tick, per tile in registry
/// order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Tiles that were redrawn successfully.
    pub delivered: Vec<TileId>,
    /// Tiles passed over: not accepting data, or not animated.
    pub skipped: Vec<TileId>,
    /// Tiles whose hook or redraw failed.
    pub faults: Vec<(TileId, TileFault)>,
}

impl DispatchReport {
    /// Whether no tile faulted.
    pub fn is_ok(&self) -> bool {
        self.faults.is_empty()
    }
}

/// A failure during scheduled animation, sent to fault listeners.
#[derive(Clone, Debug)]
pub enum FaultEvent {
    Tile { id: TileId, fault: TileFault },
    Hardware(Arc<HardwareError>),
}

impl fmt::Display for FaultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tile { id, fault } => write!(f, "tile {id}: {fault}"),
            Self::Hardware(e) => write!(f, "hardware error: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

struct Entry {
    id: TileId,
    handle: TileHandle,
    position: TilePosition,
    size: TileSize,
}

impl Entry {
    fn placement(&self) -> TilePlacement {
        TilePlacement {
            id: self.id,
            position: self.position,
            size: self.size,
        }
    }
}

/// Everything behind the registry lock.
struct Inner<M> {
    entries: Vec<Entry>,
    next_id: u64,
    matrix: M,
}

impl<M: HardwareMatrix> Inner<M> {
    fn index_of(&self, id: TileId) -> Result<usize, TileError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(TileError::UnknownTile(id))
    }

    /// Check a placement against the matrix and, in strict mode, against
    /// every entry other than `moving`. Returns the global range it covers.
    fn check_placement(
        &self,
        position: TilePosition,
        size: TileSize,
        moving: Option<TileId>,
        policy: OverlapPolicy,
    ) -> Result<Range, TileError> {
        let matrix = self.matrix.size();
        let placement = match position.checked_placement(size) {
            Some(r) if r.in_range(matrix.bounds()) => r,
            _ => {
                return Err(TileError::OutOfBounds {
                    placement: position.placement(size),
                    matrix,
                });
            }
        };
        if policy == OverlapPolicy::Reject {
            let clash = self
                .entries
                .iter()
                .filter(|e| Some(e.id) != moving)
                .find(|e| e.position.placement(e.size).overlaps(placement));
            if let Some(e) = clash {
                return Err(TileError::OverlapRejected {
                    placement,
                    existing: e.id,
                });
            }
        }
        Ok(placement)
    }

    /// Paint every visible tile over the background, in registry order.
    /// Each tile is clipped to its registered rectangle.
    fn composite(&self, background: PixelColor) -> Frame {
        let mut frame = Frame::new(self.matrix.size(), background);
        for e in &self.entries {
            let slot = e.handle.lock();
            if slot.visible() {
                frame.paint(e.position, e.size, slot.canvas());
            }
        }
        frame
    }

    fn flush(&mut self, background: PixelColor) -> Result<(), HardwareError> {
        let frame = self.composite(background);
        frame.write_to(&mut self.matrix);
        self.matrix.show()
    }
}

struct Shared<M> {
    inner: Mutex<Inner<M>>,
    config: ManagerConfig,
    listeners: Mutex<Vec<Sender<FaultEvent>>>,
}

impl<M: HardwareMatrix> Shared<M> {
    fn lock(&self) -> MutexGuard<'_, Inner<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the registry, in order.
    fn handles(&self) -> Vec<(TileId, TileHandle)> {
        self.lock()
            .entries
            .iter()
            .map(|e| (e.id, e.handle.clone()))
            .collect()
    }

    fn flush(&self) -> Result<(), TileError> {
        self.lock().flush(self.config.background)?;
        Ok(())
    }

    /// Redraw animated tiles, then composite and flush once.
    fn tick(&self) -> Result<DispatchReport, TileError> {
        let mut report = DispatchReport::default();
        for (id, handle) in self.handles() {
            let mut slot = handle.lock();
            if !slot.animate() {
                report.skipped.push(id);
                continue;
            }
            let redrawn = panic::catch_unwind(AssertUnwindSafe(|| slot.redraw()))
                .unwrap_or_else(|payload| Err(panic_fault(payload.as_ref())));
            match redrawn {
                Ok(()) => report.delivered.push(id),
                Err(fault) => report.faults.push((id, fault)),
            }
        }
        self.flush()?;
        Ok(report)
    }

    /// A tick on the animation thread: failures are logged and reported to
    /// listeners, never propagated.
    fn scheduled_tick(&self) {
        match self.tick() {
            Ok(report) => {
                trace!("tick: {} tiles redrawn", report.delivered.len());
                for (id, fault) in report.faults {
                    warn!("tile {id} failed to redraw: {fault}");
                    self.notify(FaultEvent::Tile { id, fault });
                }
            }
            Err(TileError::Hardware(e)) => {
                warn!("hardware flush failed: {e}");
                self.notify(FaultEvent::Hardware(Arc::new(e)));
            }
            Err(e) => warn!("animation tick failed: {e}"),
        }
    }

    fn notify(&self, event: FaultEvent) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// A fault carrying the message of a panic caught during a tick.
fn panic_fault(payload: &(dyn Any + Send)) -> TileFault {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    TileFault::new(format!("redraw panicked: {message}"))
}

// ---------------------------------------------------------------------------
// TileManager
// ---------------------------------------------------------------------------

/// Owns a hardware matrix and the tiles placed on it.
///
/// Tiles are drawn in registration order, so later tiles cover earlier ones
/// where they overlap. All methods take `&self`; share the manager between
/// threads with an `Arc`.
pub struct TileManager<M: HardwareMatrix + 'static> {
    shared: Arc<Shared<M>>,
    animation: Mutex<Option<Animation>>,
}

impl<M: HardwareMatrix + 'static> TileManager<M> {
    /// Create a manager with the default configuration.
    pub fn new(matrix: M) -> Self {
        Self::with_config(matrix, ManagerConfig::default())
    }

    pub fn with_config(matrix: M, config: ManagerConfig) -> Self {
        debug!("tile manager for a {} matrix", matrix.size());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    entries: Vec::new(),
                    next_id: 0,
                    matrix,
                }),
                config,
                listeners: Mutex::new(Vec::new()),
            }),
            animation: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    pub fn matrix_size(&self) -> MatrixSize {
        self.shared.lock().matrix.size()
    }

    // -- registry ----------------------------------------------------------

    /// Place `tile` on the matrix.
    ///
    /// The tile's canvas is reallocated to `size` and filled with its
    /// default color, then its `on_size_set` hook runs. On error neither the
    /// registry nor the tile changes.
    pub fn register_tile(
        &self,
        tile: &TileHandle,
        size: TileSize,
        position: TilePosition,
    ) -> Result<TileId, TileError> {
        let mut inner = self.shared.lock();
        let placement = inner.check_placement(position, size, None, self.shared.config.overlap)?;

        let mut slot = tile.lock();
        if let Some(id) = slot.registration() {
            return Err(TileError::AlreadyRegistered(id));
        }
        let id = TileId(inner.next_id);
        inner.next_id += 1;
        slot.apply_size(size);
        slot.set_registration(Some(id));
        drop(slot);

        inner.entries.push(Entry {
            id,
            handle: tile.clone(),
            position,
            size,
        });
        debug!("registered tile {id} at {placement}");
        Ok(id)
    }

    /// Remove a tile. It keeps its pixels but is no longer composited.
    pub fn unregister_tile(&self, id: TileId) -> Result<TileHandle, TileError> {
        let mut inner = self.shared.lock();
        let index = inner.index_of(id)?;
        let entry = inner.entries.remove(index);
        entry.handle.lock().set_registration(None);
        debug!("unregistered tile {id}");
        Ok(entry.handle)
    }

    /// Give a registered tile a new size, keeping its position. Validated
    /// like a registration; the canvas is reallocated and `on_size_set` runs.
    pub fn resize_tile(&self, id: TileId, size: TileSize) -> Result<(), TileError> {
        let mut inner = self.shared.lock();
        let index = inner.index_of(id)?;
        let position = inner.entries[index].position;
        inner.check_placement(position, size, Some(id), self.shared.config.overlap)?;
        let entry = &mut inner.entries[index];
        entry.size = size;
        entry.handle.lock().apply_size(size);
        debug!("resized tile {id} to {size}");
        Ok(())
    }

    /// Move a registered tile, keeping its size and pixels.
    pub fn move_tile(&self, id: TileId, position: TilePosition) -> Result<(), TileError> {
        let mut inner = self.shared.lock();
        let index = inner.index_of(id)?;
        let size = inner.entries[index].size;
        inner.check_placement(position, size, Some(id), self.shared.config.overlap)?;
        inner.entries[index].position = position;
        debug!("moved tile {id} to {position}");
        Ok(())
    }

    /// The handle registered under `id`.
    pub fn tile(&self, id: TileId) -> Option<TileHandle> {
        let inner = self.shared.lock();
        inner
            .entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.handle.clone())
    }

    /// Every registered tile, in drawing order.
    pub fn tiles(&self) -> Vec<TileHandle> {
        self.shared.handles().into_iter().map(|(_, h)| h).collect()
    }

    /// Every placement, in drawing order.
    pub fn placements(&self) -> Vec<TilePlacement> {
        self.shared
            .lock()
            .entries
            .iter()
            .map(Entry::placement)
            .collect()
    }

    // -- data --------------------------------------------------------------

    /// Deliver `data` to every tile that is accepting data, in registry
    /// order. Each tile stores the data, runs `on_data`, then redraws. A tile
    /// fault is recorded in the report and does not stop the dispatch.
    pub fn send_data_to_tiles(&self, data: TileData) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (id, handle) in self.shared.handles() {
            let mut slot = handle.lock();
            if !slot.accepting_data() {
                report.skipped.push(id);
                continue;
            }
            match slot.deliver(data.clone()) {
                Ok(()) => report.delivered.push(id),
                Err(fault) => {
                    debug!("tile {id} rejected data: {fault}");
                    report.faults.push((id, fault));
                }
            }
        }
        report
    }

    /// Deliver `data` to one tile, whether or not it is accepting data.
    pub fn send_data_to_tile(&self, id: TileId, data: TileData) -> Result<(), TileError> {
        let handle = self.tile(id).ok_or(TileError::UnknownTile(id))?;
        let mut slot = handle.lock();
        slot.deliver(data)
            .map_err(|fault| TileError::Tile { id, fault })
    }

    // -- drawing -----------------------------------------------------------

    /// Composite every visible tile and flush the result to the matrix.
    pub fn draw_hardware_matrix(&self) -> Result<(), TileError> {
        self.shared.flush()
    }

    /// Run one animation tick now: redraw every animated tile, then
    /// composite and flush once. Tile faults, including a redraw that
    /// panicked, are returned in the report; a failed flush is returned as
    /// an error.
    pub fn tick(&self) -> Result<DispatchReport, TileError> {
        self.shared.tick()
    }

    /// The composited frame, without touching the hardware.
    pub fn pixels(&self) -> Frame {
        self.shared.lock().composite(self.shared.config.background)
    }

    /// Turn every pixel off and flush. Tile buffers are left alone, so the
    /// next composite brings them back.
    pub fn clear_hardware_matrix(&self) -> Result<(), TileError> {
        let mut inner = self.shared.lock();
        Frame::new(inner.matrix.size(), PixelColor::OFF).write_to(&mut inner.matrix);
        inner.matrix.show()?;
        Ok(())
    }

    /// The matrix's global brightness, if it has one.
    pub fn brightness(&self) -> Option<u8> {
        self.shared.lock().matrix.brightness()
    }

    pub fn set_brightness(&self, brightness: u8) -> Result<(), TileError> {
        self.shared.lock().matrix.set_brightness(brightness)?;
        Ok(())
    }

    /// Run `f` with exclusive access to the matrix. No composite can run
    /// meanwhile.
    pub fn with_matrix<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.shared.lock().matrix)
    }

    // -- animation ---------------------------------------------------------

    /// Start animating at the configured frame rate.
    pub fn start(&self) -> Result<(), TileError> {
        self.start_animation(self.shared.config.frame_rate)
    }

    /// Start the animation thread. Each tick redraws the animated tiles,
    /// then composites and flushes. A running animation is stopped first;
    /// [`FrameRate::Manual`] leaves the scheduler stopped.
    pub fn start_animation(&self, rate: FrameRate) -> Result<(), TileError> {
        self.start_animation_with_clock(rate, SystemClock::new())
    }

    /// [`start_animation`](TileManager::start_animation) paced by `clock`.
    pub fn start_animation_with_clock<C>(&self, rate: FrameRate, clock: C) -> Result<(), TileError>
    where
        C: Clock + Send + 'static,
    {
        let interval = rate.interval()?;
        let mut animation = self.animation.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = animation.take() {
            running.stop();
        }
        let (Some(interval), FrameRate::PerSecond(fps)) = (interval, rate) else {
            debug!("manual frame rate, animation stays stopped");
            return Ok(());
        };
        let shared = Arc::clone(&self.shared);
        let spawned = Animation::spawn(fps, interval, clock, move || shared.scheduled_tick())
            .map_err(TileError::Scheduler)?;
        *animation = Some(spawned);
        Ok(())
    }

    /// Stop the animation thread. The tick in flight, if any, completes
    /// first; this returns once the thread has exited.
    pub fn stop_animation(&self) {
        let running = self
            .animation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            running.stop();
        }
    }

    /// `Running` while the animation thread is alive. A thread that died
    /// (a panicking matrix, say) reads as `Stopped`.
    pub fn scheduler_state(&self) -> SchedulerState {
        match &*self.animation.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(a) if a.is_running() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// The running animation's frame rate.
    pub fn frame_rate(&self) -> FrameRate {
        match &*self.animation.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(a) if a.is_running() => FrameRate::PerSecond(a.fps()),
            _ => FrameRate::Manual,
        }
    }

    /// Receive failures from scheduled ticks. Manual calls report their
    /// failures to the caller instead.
    pub fn subscribe_faults(&self) -> Receiver<FaultEvent> {
        let (tx, rx) = mpsc::channel();
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

impl<M: HardwareMatrix + 'static> fmt::Display for TileManager<M> {
    /// The composited frame as text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.pixels(), f)
    }
}

impl<M: HardwareMatrix + 'static> fmt::Debug for TileManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileManager")
            .field("matrix_size", &self.matrix_size())
            .field("placements", &self.placements())
            .field("config", &self.shared.config)
            .field("scheduler", &self.scheduler_state())
            .finish()
    }
}
