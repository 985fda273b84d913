//! The [`Canvas`] type: a tile's local pixel buffer.
//!
//! A canvas is addressed in tile-local [`PixelPosition`]s only. It has no
//! notion of where its tile sits in the matrix, so a tile draws the same way
//! wherever it is placed.

use crate::color::PixelColor;
use crate::geom::{PixelPosition, TileSize};

/// A row-major buffer of `columns * rows` colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pixels: Vec<PixelColor>,
    size: TileSize,
    default_color: PixelColor,
}

impl Canvas {
    /// Create a canvas of `size` filled with `default_color`.
    pub fn new(size: TileSize, default_color: PixelColor) -> Self {
        Self {
            pixels: vec![default_color; size.pixel_count()],
            size,
            default_color,
        }
    }

    #[inline]
    fn index(&self, p: PixelPosition) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 && p.x < self.size.columns() && p.y < self.size.rows() {
            Some((p.y as usize) * (self.size.columns() as usize) + (p.x as usize))
        } else {
            None
        }
    }

    #[inline]
    pub fn size(&self) -> TileSize {
        self.size
    }

    #[inline]
    pub fn columns(&self) -> i32 {
        self.size.columns()
    }

    #[inline]
    pub fn rows(&self) -> i32 {
        self.size.rows()
    }

    /// The color [`reset`](Canvas::reset) paints with.
    #[inline]
    pub fn default_color(&self) -> PixelColor {
        self.default_color
    }

    pub fn set_default_color(&mut self, color: PixelColor) {
        self.default_color = color;
    }

    /// Whether `p` is inside the canvas.
    #[inline]
    pub fn contains(&self, p: PixelPosition) -> bool {
        self.index(p).is_some()
    }

    /// Read the pixel at `p`, or `None` if `p` is outside the canvas.
    pub fn at(&self, p: impl Into<PixelPosition>) -> Option<PixelColor> {
        self.index(p.into()).map(|i| self.pixels[i])
    }

    /// Set the pixel at `p`. Positions outside the canvas are ignored.
    pub fn set(&mut self, p: impl Into<PixelPosition>, color: PixelColor) {
        if let Some(i) = self.index(p.into()) {
            self.pixels[i] = color;
        }
    }

    /// Fill every pixel with `color`.
    pub fn fill(&mut self, color: PixelColor) {
        self.pixels.fill(color);
    }

    /// Set every pixel to [`PixelColor::OFF`].
    pub fn clear(&mut self) {
        self.fill(PixelColor::OFF);
    }

    /// Set every pixel to the default color.
    pub fn reset(&mut self) {
        self.fill(self.default_color);
    }

    /// Reallocate for `size` and fill with the default color. Only the
    /// manager sizes a canvas, when a tile is placed or resized.
    pub(crate) fn resize(&mut self, size: TileSize) {
        self.size = size;
        self.pixels.clear();
        self.pixels.resize(size.pixel_count(), self.default_color);
    }

    /// Apply `f` to every pixel, replacing each with the return value.
    pub fn map_pixels<F: FnMut(PixelPosition, PixelColor) -> PixelColor>(&mut self, mut f: F) {
        let cols = self.size.columns().max(1) as usize;
        for (i, c) in self.pixels.iter_mut().enumerate() {
            let p = PixelPosition::new((i % cols) as i32, (i / cols) as i32);
            *c = f(p, *c);
        }
    }

    /// The pixels in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[PixelColor] {
        &self.pixels
    }

    /// The pixels as one `Vec` per row.
    pub fn to_rows(&self) -> Vec<Vec<PixelColor>> {
        self.pixels
            .chunks(self.size.columns() as usize)
            .map(<[PixelColor]>::to_vec)
            .collect()
    }

    /// Row-major iterator over `(PixelPosition, PixelColor)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PixelPosition, PixelColor)> + '_ {
        self.size
            .local_bounds()
            .iter()
            .zip(self.pixels.iter().copied())
            .map(|(p, c)| (PixelPosition::from(p), c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: PixelColor = PixelColor::rgb(100, 200, 50);
    const SPECIAL: PixelColor = PixelColor::rgb(99, 99, 99);

    fn canvas_10x5() -> Canvas {
        Canvas::new(TileSize::new(10, 5).unwrap(), MAIN)
    }

    #[test]
    fn new_canvas_is_filled_with_default() {
        let c = canvas_10x5();
        assert_eq!(c.as_slice().len(), 50);
        assert!(c.iter().all(|(_, px)| px == MAIN));
        let rows = c.to_rows();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.len() == 10));
    }

    #[test]
    fn set_pixel_only_touches_target() {
        let mut c = canvas_10x5();
        c.set((1, 1), SPECIAL);
        c.set(PixelPosition::new(2, 2), SPECIAL);
        for (p, px) in c.iter() {
            if p == PixelPosition::new(1, 1) || p == PixelPosition::new(2, 2) {
                assert_eq!(px, SPECIAL);
            } else {
                assert_eq!(px, MAIN);
            }
        }
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let mut c = canvas_10x5();
        let before = c.clone();
        c.set((999, -999), PixelColor::OFF);
        c.set((10, 0), PixelColor::OFF);
        c.set((0, 5), PixelColor::OFF);
        assert_eq!(c, before);
        assert_eq!(c.at((10, 0)), None);
    }

    #[test]
    fn clear_and_reset() {
        let mut c = canvas_10x5();
        c.clear();
        assert!(c.iter().all(|(_, px)| px == PixelColor::OFF));
        c.set_default_color(SPECIAL);
        c.reset();
        assert!(c.iter().all(|(_, px)| px == SPECIAL));
    }

    #[test]
    fn resize_reallocates_with_default() {
        let mut c = canvas_10x5();
        c.set((0, 0), SPECIAL);
        c.resize(TileSize::new(3, 2).unwrap());
        assert_eq!(c.size(), TileSize::new(3, 2).unwrap());
        assert_eq!(c.as_slice(), &[MAIN; 6]);
    }

    #[test]
    fn map_pixels_sees_local_positions() {
        let mut c = Canvas::new(TileSize::new(3, 2).unwrap(), PixelColor::OFF);
        c.map_pixels(|p, _| PixelColor::rgb(p.x as u8, p.y as u8, 0));
        assert_eq!(c.at((2, 1)), Some(PixelColor::rgb(2, 1, 0)));
        assert_eq!(c.at((0, 1)), Some(PixelColor::rgb(0, 1, 0)));
    }
}
