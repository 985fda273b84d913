//! LED strips: the [`LedStrip`] sink, [`StripMatrix`] which presents a strip
//! as a [`HardwareMatrix`], and two strips, [`MemoryStrip`] and
//! [`WriterStrip`].

use std::io::Write;

use log::debug;
use neotiles_core::{HardwareError, HardwareMatrix, MatrixSize, PixelColor};

use crate::layout::StripLayout;

/// A chain of addressable LEDs, written as one flat frame.
pub trait LedStrip: Send {
    /// Number of LEDs on the strip.
    fn len(&self) -> usize;

    /// Whether the strip has no LEDs.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latch `pixels` onto the strip. `pixels.len()` never exceeds
    /// [`len`](LedStrip::len).
    fn write(&mut self, pixels: &[PixelColor]) -> Result<(), HardwareError>;
}

// ---------------------------------------------------------------------------
// StripMatrix
// ---------------------------------------------------------------------------

/// A [`HardwareMatrix`] over an [`LedStrip`].
///
/// Pixels are staged in strip order through the [`StripLayout`]. Global
/// brightness is applied when the frame is written, so staged colors are
/// never lossy.
#[derive(Debug)]
pub struct StripMatrix<S> {
    strip: S,
    layout: StripLayout,
    staged: Vec<PixelColor>,
    scaled: Vec<PixelColor>,
    brightness: u8,
}

impl<S: LedStrip> StripMatrix<S> {
    /// Fails if the strip is shorter than the layout.
    pub fn new(strip: S, layout: StripLayout) -> Result<Self, HardwareError> {
        if strip.len() < layout.len() {
            return Err(HardwareError::new(format!(
                "strip has {} LEDs, layout needs {}",
                strip.len(),
                layout.len()
            )));
        }
        debug!("strip matrix {} over {} LEDs", layout.size(), strip.len());
        Ok(Self {
            staged: vec![PixelColor::OFF; layout.len()],
            scaled: Vec::with_capacity(layout.len()),
            strip,
            layout,
            brightness: u8::MAX,
        })
    }

    /// Set the initial brightness (builder).
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = brightness;
        self
    }

    pub fn layout(&self) -> &StripLayout {
        &self.layout
    }

    pub fn strip(&self) -> &S {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut S {
        &mut self.strip
    }

    pub fn into_strip(self) -> S {
        self.strip
    }
}

impl<S: LedStrip> HardwareMatrix for StripMatrix<S> {
    fn size(&self) -> MatrixSize {
        self.layout.size()
    }

    fn set_pixel(&mut self, column: i32, row: i32, color: PixelColor) {
        if let Some(i) = self.layout.index(column, row) {
            self.staged[i] = color;
        }
    }

    fn show(&mut self) -> Result<(), HardwareError> {
        if self.brightness == u8::MAX {
            return self.strip.write(&self.staged);
        }
        let factor = f32::from(self.brightness) / 255.0;
        self.scaled.clear();
        self.scaled.extend(self.staged.iter().map(|c| c.scale(factor)));
        self.strip.write(&self.scaled)
    }

    fn brightness(&self) -> Option<u8> {
        Some(self.brightness)
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), HardwareError> {
        self.brightness = brightness;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStrip
// ---------------------------------------------------------------------------

/// A strip that keeps the last frame written to it.
#[derive(Clone, Debug, Default)]
pub struct MemoryStrip {
    leds: Vec<PixelColor>,
    writes: u64,
}

impl MemoryStrip {
    pub fn new(len: usize) -> Self {
        Self {
            leds: vec![PixelColor::OFF; len],
            writes: 0,
        }
    }

    /// The LEDs as last latched.
    pub fn leds(&self) -> &[PixelColor] {
        &self.leds
    }

    /// Number of frames written.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl LedStrip for MemoryStrip {
    fn len(&self) -> usize {
        self.leds.len()
    }

    fn write(&mut self, pixels: &[PixelColor]) -> Result<(), HardwareError> {
        self.leds[..pixels.len()].copy_from_slice(pixels);
        self.writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// WriterStrip
// ---------------------------------------------------------------------------

/// Byte order of one LED on the wire.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelOrder {
    Rgb,
    /// WS2812 and most other NeoPixels.
    #[default]
    Grb,
    Rgbw,
    Grbw,
}

impl ChannelOrder {
    /// Bytes per LED.
    pub const fn width(self) -> usize {
        match self {
            Self::Rgb | Self::Grb => 3,
            Self::Rgbw | Self::Grbw => 4,
        }
    }

    fn encode(self, c: PixelColor, out: &mut Vec<u8>) {
        let w = c.white.unwrap_or(0);
        match self {
            Self::Rgb => out.extend_from_slice(&[c.red, c.green, c.blue]),
            Self::Grb => out.extend_from_slice(&[c.green, c.red, c.blue]),
            Self::Rgbw => out.extend_from_slice(&[c.red, c.green, c.blue, w]),
            Self::Grbw => out.extend_from_slice(&[c.green, c.red, c.blue, w]),
        }
    }
}

/// A strip driven by raw bytes written to `W`, such as an SPI device node
/// or a serial link to a microcontroller. Each frame is encoded in one
/// buffer, written with a single `write_all`, then flushed.
#[derive(Debug)]
pub struct WriterStrip<W> {
    out: W,
    len: usize,
    order: ChannelOrder,
    buf: Vec<u8>,
}

impl<W: Write + Send> WriterStrip<W> {
    pub fn new(out: W, len: usize, order: ChannelOrder) -> Self {
        Self {
            out,
            len,
            order,
            buf: Vec::with_capacity(len * order.width()),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> LedStrip for WriterStrip<W> {
    fn len(&self) -> usize {
        self.len
    }

    fn write(&mut self, pixels: &[PixelColor]) -> Result<(), HardwareError> {
        self.buf.clear();
        for &c in pixels {
            self.order.encode(c, &mut self.buf);
        }
        self.out
            .write_all(&self.buf)
            .and_then(|()| self.out.flush())
            .map_err(|e| HardwareError::io("failed to write LED frame", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Wiring;
    use std::io;

    fn layout(c: i32, r: i32, wiring: Wiring) -> StripLayout {
        StripLayout::new(MatrixSize::new(c, r).unwrap(), wiring)
    }

    #[test]
    fn pixels_land_at_layout_indices() {
        let mut m = StripMatrix::new(MemoryStrip::new(9), layout(3, 3, Wiring::SerpentineRows)).unwrap();
        let red = PixelColor::rgb(255, 0, 0);
        m.set_pixel(0, 1, red);
        m.set_pixel(3, 3, red);
        m.show().unwrap();
        let leds = m.strip().leds();
        assert_eq!(leds[5], red);
        assert_eq!(leds.iter().filter(|c| **c == red).count(), 1);
        assert_eq!(m.strip().writes(), 1);
    }

    #[test]
    fn brightness_scales_on_show_only() {
        let mut m = StripMatrix::new(MemoryStrip::new(1), layout(1, 1, Wiring::RowMajor))
            .unwrap()
            .with_brightness(128);
        m.set_pixel(0, 0, PixelColor::rgbw(255, 100, 0, 10));
        m.show().unwrap();
        assert_eq!(m.strip().leds()[0], PixelColor::rgbw(128, 50, 0, 5));

        m.set_brightness(255).unwrap();
        m.show().unwrap();
        assert_eq!(m.strip().leds()[0], PixelColor::rgbw(255, 100, 0, 10));
        assert_eq!(m.brightness(), Some(255));
    }

    #[test]
    fn short_strip_is_rejected() {
        let err = StripMatrix::new(MemoryStrip::new(5), layout(3, 2, Wiring::RowMajor)).unwrap_err();
        assert_eq!(err.message(), "strip has 5 LEDs, layout needs 6");
    }

    #[test]
    fn longer_strip_keeps_its_tail() {
        let mut strip = MemoryStrip::new(3);
        strip.write(&[PixelColor::rgb(1, 1, 1); 3]).unwrap();
        let mut m = StripMatrix::new(strip, layout(2, 1, Wiring::RowMajor)).unwrap();
        m.show().unwrap();
        assert_eq!(m.strip().leds()[2], PixelColor::rgb(1, 1, 1));
        assert_eq!(m.strip().leds()[0], PixelColor::OFF);
    }

    #[test]
    fn writer_strip_encodes_channel_order() {
        let colors = [PixelColor::rgb(1, 2, 3), PixelColor::rgbw(4, 5, 6, 7)];

        let mut grb = WriterStrip::new(Vec::new(), 2, ChannelOrder::Grb);
        grb.write(&colors).unwrap();
        assert_eq!(grb.get_ref(), &[2, 1, 3, 5, 4, 6]);

        let mut rgbw = WriterStrip::new(Vec::new(), 2, ChannelOrder::Rgbw);
        rgbw.write(&colors).unwrap();
        assert_eq!(rgbw.into_inner(), vec![1, 2, 3, 0, 4, 5, 6, 7]);
    }

    #[test]
    fn writer_errors_become_hardware_errors() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut m = StripMatrix::new(
            WriterStrip::new(Broken, 1, ChannelOrder::Grb),
            layout(1, 1, Wiring::RowMajor),
        )
        .unwrap();
        let err = m.show().unwrap_err();
        assert_eq!(err.message(), "failed to write LED frame");
        assert!(std::error::Error::source(&err).is_some());
    }
}
