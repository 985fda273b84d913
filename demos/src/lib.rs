//! Demo tiles and the terminal plumbing shared by the demo binaries.
//!
//! Each demo draws a [`COLUMNS`] x [`ROWS`] matrix in the terminal and exits
//! on `q`, Esc or Ctrl-C. Logs go to `neotiles-demo.log` in the temp
//! directory, since the terminal is busy showing the matrix.

use std::error::Error;
use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{info, warn};
use neotiles_core::{
    Canvas, ManagerConfig, MatrixSize, PixelColor, Tile, TileData, TileFault, TileManager,
    TileSize,
};
use neotiles_matrix::TerminalMatrix;
use rand::Rng;

pub const COLUMNS: i32 = 16;
pub const ROWS: i32 = 16;

pub type DemoResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Terminal plumbing
// ---------------------------------------------------------------------------

/// Send logs to a file in the temp directory, or to stderr if it cannot be
/// created.
pub fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let path = std::env::temp_dir().join("neotiles-demo.log");
    if let Ok(file) = File::create(&path) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.format_timestamp_millis().init();
    info!("logging to {}", path.display());
}

/// A manager over a terminal matrix in raw mode.
pub fn open_terminal(config: ManagerConfig) -> Result<TileManager<TerminalMatrix>, Box<dyn Error>> {
    let size = MatrixSize::new(COLUMNS, ROWS)?;
    let manager = TileManager::with_config(TerminalMatrix::new(size), config);
    manager.with_matrix(|m| m.init())?;
    Ok(manager)
}

/// Stop animating, blank the matrix and restore the terminal.
pub fn close_terminal(manager: &TileManager<TerminalMatrix>) {
    manager.stop_animation();
    if let Err(e) = manager.clear_hardware_matrix() {
        warn!("failed to clear the matrix: {e}");
    }
    manager.with_matrix(|m| m.close());
}

/// Wait up to `timeout` for a quit key. Returns `true` if one was pressed.
pub fn quit_requested(timeout: Duration) -> std::io::Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        if !event::poll(left)? {
            return Ok(false);
        }
        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(true);
                }
                _ => {}
            }
        }
    }
}

/// Run `step` every `period` until a quit key is pressed, then close the
/// terminal. The terminal is restored even if `step` fails.
pub fn run_until_quit<F>(manager: &TileManager<TerminalMatrix>, period: Duration, mut step: F) -> DemoResult
where
    F: FnMut() -> DemoResult,
{
    let result = (|| -> DemoResult {
        loop {
            step()?;
            if quit_requested(period)? {
                return Ok(());
            }
        }
    })();
    close_terminal(manager);
    result
}

/// A random color with each channel uniform in [0, 1).
pub fn random_color() -> PixelColor {
    let mut rng = rand::rng();
    PixelColor::from_normalized(rng.random(), rng.random(), rng.random())
}

// ---------------------------------------------------------------------------
// SpeckledTile
// ---------------------------------------------------------------------------

/// Takes a [`PixelColor`] as data and paints every pixel with that color at
/// a random intensity between 0.4 and 1.0. Does nothing until it has a
/// color.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeckledTile;

impl Tile for SpeckledTile {
    fn draw(&mut self, canvas: &mut Canvas, data: Option<&TileData>) -> Result<(), TileFault> {
        let Some(base) = data.and_then(|d| d.downcast_ref::<PixelColor>()) else {
            return Ok(());
        };
        let mut rng = rand::rng();
        canvas.map_pixels(|_, _| base.scale(rng.random_range(0.4..=1.0)));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FireTile
// ---------------------------------------------------------------------------

/// The edge a fire burns from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FireBase {
    #[default]
    Bottom,
    Top,
}

/// Convert hue, saturation and lightness, each in 0..=255, to a color.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> PixelColor {
    fn hue(p: f32, q: f32, mut t: f32) -> f32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let (h, s, l) = (h / 255.0, s / 255.0, l / 255.0);
    if s == 0.0 {
        return PixelColor::from_normalized(l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    PixelColor::from_normalized(
        hue(p, q, h + 1.0 / 3.0),
        hue(p, q, h),
        hue(p, q, h - 1.0 / 3.0),
    )
}

/// A flickering fire. The heat buffer has one hidden row beyond the base
/// that is reseeded with random heat every frame; heat then spreads away
/// from the base, cooling by `divisor`.
#[derive(Clone, Debug)]
pub struct FireTile {
    divisor: f32,
    base: FireBase,
    palette: Vec<PixelColor>,
    heat: Vec<u8>,
    columns: i32,
    rows: i32,
}

impl FireTile {
    /// `divisor` sets the flame height (larger is shorter); `hue_offset`
    /// shifts the palette away from red.
    pub fn new(divisor: f32, hue_offset: u8, base: FireBase) -> Self {
        let palette = (0..=255u16)
            .map(|x| {
                let h = f32::from(hue_offset) + f32::from(x / 3);
                hsl_to_rgb(h, 255.0, f32::from((x * 2).min(255)))
            })
            .collect();
        Self {
            divisor,
            base,
            palette,
            heat: Vec::new(),
            columns: 0,
            rows: 0,
        }
    }

    /// Heat at `(x, y)`, wrapping both axes. The buffer is `rows + 1` tall.
    fn heat(&self, x: i32, y: i32) -> u8 {
        self.heat[self.index(x, y)]
    }

    fn set_heat(&mut self, x: i32, y: i32, value: u8) {
        let i = self.index(x, y);
        self.heat[i] = value;
    }

    fn index(&self, x: i32, y: i32) -> usize {
        let x = x.rem_euclid(self.columns);
        let y = y.rem_euclid(self.rows + 1);
        (y * self.columns + x) as usize
    }
}

impl Tile for FireTile {
    fn on_size_set(&mut self, size: TileSize) {
        self.columns = size.columns();
        self.rows = size.rows();
        self.heat = vec![0; (self.columns * (self.rows + 1)) as usize];
    }

    fn draw(&mut self, canvas: &mut Canvas, _data: Option<&TileData>) -> Result<(), TileFault> {
        if self.heat.is_empty() {
            return Err(TileFault::new("fire drawn before it was sized"));
        }
        let mut rng = rand::rng();
        let (hidden, step) = match self.base {
            FireBase::Bottom => (self.rows, 1),
            FireBase::Top => (-1, -1),
        };
        for x in 0..self.columns {
            self.set_heat(x, hidden, rng.random());
        }

        let rows: Vec<i32> = match self.base {
            FireBase::Bottom => (0..self.rows).collect(),
            FireBase::Top => (0..self.rows).rev().collect(),
        };
        for x in 0..self.columns {
            for &y in &rows {
                let sum = u32::from(self.heat(x - 1, y + step))
                    + u32::from(self.heat(x, y + step))
                    + u32::from(self.heat(x + 1, y + step))
                    + u32::from(self.heat(x, y + 2 * step));
                let value = (sum as f32 / self.divisor).min(255.0) as u8;
                self.set_heat(x, y, value);
            }
        }

        let palette = &self.palette;
        let heat = &self.heat;
        let columns = self.columns;
        canvas.map_pixels(|p, _| palette[heat[(p.y * columns + p.x) as usize] as usize]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neotiles_core::{TileHandle, TilePosition, VirtualMatrix};

    #[test]
    fn speckles_stay_within_intensity_band() {
        let t = TileHandle::new(SpeckledTile);
        let m = TileManager::new(VirtualMatrix::new(MatrixSize::new(4, 4).unwrap()));
        let id = m
            .register_tile(&t, TileSize::new(4, 4).unwrap(), TilePosition::ORIGIN)
            .unwrap();
        m.send_data_to_tile(id, TileData::new(PixelColor::rgb(200, 100, 0)))
            .unwrap();
        for row in t.pixels() {
            for c in row {
                assert!((80..=200).contains(&c.red), "{c}");
                assert!((40..=100).contains(&c.green), "{c}");
                assert_eq!(c.blue, 0);
            }
        }
    }

    #[test]
    fn speckled_tile_waits_for_a_color() {
        let t = TileHandle::new(SpeckledTile).with_default_color(PixelColor::rgb(1, 2, 3));
        t.draw().unwrap();
        assert_eq!(t.pixel((0, 0)), Some(PixelColor::rgb(1, 2, 3)));
    }

    #[test]
    fn hsl_grey_and_red() {
        assert_eq!(hsl_to_rgb(0.0, 0.0, 255.0), PixelColor::rgb(255, 255, 255));
        assert_eq!(hsl_to_rgb(0.0, 255.0, 0.0), PixelColor::OFF);
        let red = hsl_to_rgb(0.0, 255.0, 127.5);
        assert_eq!((red.green, red.blue), (0, 0));
        assert!(red.red >= 254);
    }

    #[test]
    fn fire_palette_starts_black() {
        let fire = FireTile::new(7.2, 0, FireBase::Bottom);
        assert_eq!(fire.palette.len(), 256);
        assert_eq!(fire.palette[0], PixelColor::OFF);
    }

    #[test]
    fn fire_sizes_heat_buffer_and_draws() {
        let t = TileHandle::new(FireTile::new(7.2, 50, FireBase::Top)).with_animate(true);
        assert!(t.draw().is_err());

        let m = TileManager::new(VirtualMatrix::new(MatrixSize::new(8, 8).unwrap()));
        m.register_tile(&t, TileSize::new(4, 8).unwrap(), TilePosition::ORIGIN)
            .unwrap();
        for _ in 0..20 {
            assert!(m.tick().unwrap().is_ok());
        }
        assert_eq!(t.size(), TileSize::new(4, 8).unwrap());
    }
}
