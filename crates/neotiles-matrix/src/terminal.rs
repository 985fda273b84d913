//! A matrix rendered in a terminal with crossterm.
//!
//! Each pixel is two character cells wide with its color as the background,
//! which keeps pixels roughly square. Only pixels that changed since the last
//! [`show`](HardwareMatrix::show) are redrawn.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Color as CtColor, Print, ResetColor, SetBackgroundColor},
    terminal::{self, ClearType},
};
use log::debug;
use neotiles_core::{HardwareError, HardwareMatrix, MatrixSize, PixelColor};

/// Maps a pixel to a terminal color. A white channel is blended into the
/// other three, since a terminal has no separate white emitter.
fn to_ct_color(c: PixelColor) -> CtColor {
    let w = u16::from(c.white.unwrap_or(0));
    let mix = |v: u8| (u16::from(v) + w).min(255) as u8;
    CtColor::Rgb {
        r: mix(c.red),
        g: mix(c.green),
        b: mix(c.blue),
    }
}

/// A matrix drawn at the top-left of a terminal.
pub struct TerminalMatrix<W: Write = Stdout> {
    out: W,
    size: MatrixSize,
    staged: Vec<PixelColor>,
    /// What the terminal shows now, post-brightness. `None` forces a redraw.
    drawn: Vec<Option<PixelColor>>,
    brightness: u8,
    active: bool,
}

impl TerminalMatrix<Stdout> {
    /// A matrix drawn on standard output.
    pub fn new(size: MatrixSize) -> Self {
        Self::with_writer(size, io::stdout())
    }
}

impl<W: Write> TerminalMatrix<W> {
    pub fn with_writer(size: MatrixSize, out: W) -> Self {
        Self {
            out,
            size,
            staged: vec![PixelColor::OFF; size.pixel_count()],
            drawn: vec![None; size.pixel_count()],
            brightness: u8::MAX,
            active: false,
        }
    }

    /// Switch the terminal to raw mode on the alternate screen.
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.out,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        )?;
        self.active = true;
        self.drawn.fill(None);
        debug!("terminal matrix {} initialized", self.size);
        Ok(())
    }

    /// Restore the terminal. Called on drop if [`init`](Self::init) ran.
    pub fn close(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let _ = execute!(
            self.out,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn render(&mut self) -> io::Result<usize> {
        let factor = f32::from(self.brightness) / 255.0;
        let columns = self.size.columns() as usize;
        let mut changed = 0;
        for (i, staged) in self.staged.iter().enumerate() {
            let color = staged.scale(factor);
            if self.drawn[i] == Some(color) {
                continue;
            }
            let (column, row) = (i % columns, i / columns);
            queue!(
                self.out,
                cursor::MoveTo((column * 2) as u16, row as u16),
                SetBackgroundColor(to_ct_color(color)),
                Print("  ")
            )?;
            self.drawn[i] = Some(color);
            changed += 1;
        }
        if changed > 0 {
            queue!(self.out, ResetColor)?;
        }
        self.out.flush()?;
        Ok(changed)
    }
}

impl<W: Write + Send> HardwareMatrix for TerminalMatrix<W> {
    fn size(&self) -> MatrixSize {
        self.size
    }

    fn set_pixel(&mut self, column: i32, row: i32, color: PixelColor) {
        if column < 0 || row < 0 || column >= self.size.columns() || row >= self.size.rows() {
            return;
        }
        self.staged[row as usize * self.size.columns() as usize + column as usize] = color;
    }

    fn show(&mut self) -> Result<(), HardwareError> {
        self.render()
            .map(|_| ())
            .map_err(|e| HardwareError::io("failed to draw to terminal", e))
    }

    fn brightness(&self) -> Option<u8> {
        Some(self.brightness)
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), HardwareError> {
        self.brightness = brightness;
        Ok(())
    }
}

impl<W: Write> Drop for TerminalMatrix<W> {
    fn drop(&mut self) {
        self.close();
    }
}
