//! The animation scheduler: [`FrameRate`], [`SchedulerState`], the
//! cancellation [`Context`], the [`Clock`] ticks are paced against, and the
//! background thread that drives them.
//!
//! Ticks are paced against absolute deadlines. When a tick overruns its
//! interval, the next one fires immediately and the deadline is re-based on
//! the current time: a slow frame costs at most one missed tick instead of
//! pushing every later tick back (or bursting to catch up).

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};

use crate::error::TileError;

// ---------------------------------------------------------------------------
// FrameRate / SchedulerState
// ---------------------------------------------------------------------------

/// How often the manager redraws animated tiles and flushes the matrix.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameRate {
    /// No periodic animation; the caller composites manually.
    #[default]
    Manual,
    /// Target frames per second.
    PerSecond(f64),
}

impl FrameRate {
    /// The tick interval, or `None` for [`FrameRate::Manual`].
    ///
    /// Fails with [`TileError::InvalidFrameRate`] unless the rate is a
    /// positive, finite number whose interval fits a [`Duration`].
    pub fn interval(self) -> Result<Option<Duration>, TileError> {
        match self {
            Self::Manual => Ok(None),
            Self::PerSecond(fps) if fps.is_finite() && fps > 0.0 => {
                Duration::try_from_secs_f64(1.0 / fps)
                    .map(Some)
                    .map_err(|_| TileError::InvalidFrameRate(fps))
            }
            Self::PerSecond(fps) => Err(TileError::InvalidFrameRate(fps)),
        }
    }
}

/// Whether the animation thread is running.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

// ---------------------------------------------------------------------------
// Context (cancellation token)
// ---------------------------------------------------------------------------

/// A cooperative cancellation token that can also be slept on.
#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Context {
    /// Create a new, non-cancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested.
    pub fn is_done(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request cancellation and wake any sleeper.
    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Sleep for up to `dur`. Returns `true` if the context was cancelled
    /// before or during the wait.
    pub fn wait_timeout(&self, dur: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let done = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (done, _) = cvar
            .wait_timeout_while(done, dur, |done| !*done)
            .unwrap_or_else(PoisonError::into_inner);
        *done
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source for the scheduler.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block until `deadline` (measured from the origin). Returns `false` if
    /// `ctx` was cancelled first.
    fn sleep_until(&self, ctx: &Context, deadline: Duration) -> bool;
}

/// Wall-clock time, measured from construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, ctx: &Context, deadline: Duration) -> bool {
        let wait = deadline.saturating_sub(self.now());
        !ctx.wait_timeout(wait)
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Tracks the deadline of the next tick.
#[derive(Debug)]
struct Pacer {
    interval: Duration,
    deadline: Duration,
}

impl Pacer {
    fn new(interval: Duration, start: Duration) -> Self {
        Self {
            interval,
            deadline: start,
        }
    }

    /// Called after a tick finishes at `now`. Returns the deadline to sleep
    /// until, or `None` if the tick overran and the next one is due now.
    fn advance(&mut self, now: Duration) -> Option<Duration> {
        self.deadline += self.interval;
        if self.deadline <= now {
            self.deadline = now;
            None
        } else {
            Some(self.deadline)
        }
    }
}

/// Call `tick` every `interval` until `ctx` is cancelled. The first tick
/// fires immediately. Returns the number of ticks run.
///
/// Cancellation is only observed between ticks, never during one.
pub(crate) fn run<C, F>(ctx: &Context, clock: &C, interval: Duration, mut tick: F) -> u64
where
    C: Clock + ?Sized,
    F: FnMut(),
{
    let mut pacer = Pacer::new(interval, clock.now());
    let mut ticks = 0;
    while !ctx.is_done() {
        tick();
        ticks += 1;
        if let Some(deadline) = pacer.advance(clock.now()) {
            if !clock.sleep_until(ctx, deadline) {
                break;
            }
        }
    }
    ticks
}

// ---------------------------------------------------------------------------
// Animation thread
// ---------------------------------------------------------------------------

/// A running animation thread.
#[derive(Debug)]
pub(crate) struct Animation {
    ctx: Context,
    handle: Option<JoinHandle<u64>>,
    fps: f64,
}

impl Animation {
    /// Spawn a thread calling `tick` `fps` times per second.
    pub(crate) fn spawn<C, F>(fps: f64, interval: Duration, clock: C, tick: F) -> io::Result<Self>
    where
        C: Clock + Send + 'static,
        F: FnMut() + Send + 'static,
    {
        let ctx = Context::new();
        let thread_ctx = ctx.clone();
        let handle = thread::Builder::new()
            .name("neotiles-animation".into())
            .spawn(move || run(&thread_ctx, &clock, interval, tick))?;
        debug!("animation started at {fps} fps");
        Ok(Self {
            ctx,
            handle: Some(handle),
            fps,
        })
    }

    pub(crate) fn fps(&self) -> f64 {
        self.fps
    }

    /// Whether the thread is still ticking.
    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Request a stop and wait for the in-flight tick to finish.
    pub(crate) fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        self.ctx.cancel();
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        match handle.join() {
            Ok(ticks) => {
                debug!("animation stopped after {ticks} ticks");
                ticks
            }
            Err(_) => {
                error!("animation thread panicked");
                0
            }
        }
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
