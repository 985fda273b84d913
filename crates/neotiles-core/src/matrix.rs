//! The hardware contract: [`HardwareMatrix`], and [`VirtualMatrix`], an
//! in-memory implementation.

use crate::color::PixelColor;
use crate::error::HardwareError;
use crate::geom::{MatrixSize, Point};

/// A physical (or simulated) pixel matrix.
///
/// The tile manager only ever addresses pixels by `(column, row)` inside
/// [`size`](HardwareMatrix::size). How a pixel maps onto the device's native
/// addressing (a serpentine strip, a chain of panels, a terminal cell) is
/// entirely up to the implementation.
pub trait HardwareMatrix: Send {
    /// Dimensions of the matrix.
    fn size(&self) -> MatrixSize;

    /// Stage the color of one pixel. Coordinates outside
    /// [`size`](HardwareMatrix::size) are ignored.
    fn set_pixel(&mut self, column: i32, row: i32, color: PixelColor);

    /// Push the staged pixels to the device.
    fn show(&mut self) -> Result<(), HardwareError>;

    /// Current global brightness (0-255), if the matrix has one.
    fn brightness(&self) -> Option<u8> {
        None
    }

    /// Set the global brightness.
    fn set_brightness(&mut self, _brightness: u8) -> Result<(), HardwareError> {
        Err(HardwareError::unsupported("brightness"))
    }
}

impl<M: HardwareMatrix + ?Sized> HardwareMatrix for Box<M> {
    fn size(&self) -> MatrixSize {
        (**self).size()
    }

    fn set_pixel(&mut self, column: i32, row: i32, color: PixelColor) {
        (**self).set_pixel(column, row, color)
    }

    fn show(&mut self) -> Result<(), HardwareError> {
        (**self).show()
    }

    fn brightness(&self) -> Option<u8> {
        (**self).brightness()
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), HardwareError> {
        (**self).set_brightness(brightness)
    }
}

/// An in-memory matrix.
///
/// Staged pixels become visible through [`pixel`](VirtualMatrix::pixel) only
/// after [`show`](HardwareMatrix::show), like real hardware.
#[derive(Clone, Debug)]
pub struct VirtualMatrix {
    size: MatrixSize,
    staged: Vec<PixelColor>,
    shown: Vec<PixelColor>,
    brightness: u8,
    shows: u64,
    writes: u64,
}

impl VirtualMatrix {
    pub fn new(size: MatrixSize) -> Self {
        Self {
            size,
            staged: vec![PixelColor::OFF; size.pixel_count()],
            shown: vec![PixelColor::OFF; size.pixel_count()],
            brightness: 255,
            shows: 0,
            writes: 0,
        }
    }

    #[inline]
    fn index(&self, column: i32, row: i32) -> Option<usize> {
        self.size
            .bounds()
            .contains(Point::new(column, row))
            .then(|| (row as usize) * (self.size.columns() as usize) + (column as usize))
    }

    /// The last shown color at `(column, row)`, or `None` outside the matrix.
    pub fn pixel(&self, column: i32, row: i32) -> Option<PixelColor> {
        self.index(column, row).map(|i| self.shown[i])
    }

    /// The last shown frame in row-major order.
    pub fn shown(&self) -> &[PixelColor] {
        &self.shown
    }

    /// Number of times [`show`](HardwareMatrix::show) was called.
    pub fn show_count(&self) -> u64 {
        self.shows
    }

    /// Number of in-bounds [`set_pixel`](HardwareMatrix::set_pixel) calls.
    pub fn write_count(&self) -> u64 {
        self.writes
    }
}

impl HardwareMatrix for VirtualMatrix {
    fn size(&self) -> MatrixSize {
        self.size
    }

    fn set_pixel(&mut self, column: i32, row: i32, color: PixelColor) {
        if let Some(i) = self.index(column, row) {
            self.staged[i] = color;
            self.writes += 1;
        }
    }

    fn show(&mut self) -> Result<(), HardwareError> {
        self.shown.copy_from_slice(&self.staged);
        self.shows += 1;
        Ok(())
    }

    fn brightness(&self) -> Option<u8> {
        Some(self.brightness)
    }

    fn set_brightness(&mut self, brightness: u8) -> Result<(), HardwareError> {
        self.brightness = brightness;
        Ok(())
    }
}
