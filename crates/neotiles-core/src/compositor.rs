//! Compositing: merging tile canvases into one matrix-sized [`Frame`].
//!
//! Layers are painted in order, so where placements overlap the later layer
//! wins. Pixels no layer covers keep the background color. Nothing here
//! touches hardware; [`Frame::write_to`] hands the finished frame to a
//! [`HardwareMatrix`] one `(column, row)` at a time.

use std::fmt;

use crate::canvas::Canvas;
use crate::color::PixelColor;
use crate::geom::{MatrixSize, PixelPosition, Point, TilePosition, TileSize};
use crate::matrix::HardwareMatrix;

/// A complete matrix image in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    size: MatrixSize,
    pixels: Vec<PixelColor>,
}

impl Frame {
    /// A frame filled with `background`.
    pub fn new(size: MatrixSize, background: PixelColor) -> Self {
        Self {
            size,
            pixels: vec![background; size.pixel_count()],
        }
    }

    #[inline]
    fn index(&self, p: Point) -> Option<usize> {
        self.size
            .bounds()
            .contains(p)
            .then(|| (p.y as usize) * (self.size.columns() as usize) + (p.x as usize))
    }

    #[inline]
    pub fn size(&self) -> MatrixSize {
        self.size
    }

    /// The color at global `(column, row)`.
    pub fn at(&self, column: i32, row: i32) -> Option<PixelColor> {
        self.index(Point::new(column, row)).map(|i| self.pixels[i])
    }

    /// Paint `canvas` into the `size` rectangle whose top-left corner is at
    /// `position`. Canvas pixels outside that rectangle, and rectangle pixels
    /// outside the matrix, are dropped. Returns the number of pixels written.
    pub fn paint(&mut self, position: TilePosition, size: TileSize, canvas: &Canvas) -> usize {
        let mut written = 0;
        for local in size.local_bounds() {
            let local = PixelPosition::from(local);
            let Some(color) = canvas.at(local) else {
                continue;
            };
            if let Some(i) = self.index(position.to_global(local)) {
                self.pixels[i] = color;
                written += 1;
            }
        }
        written
    }

    /// The pixels in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[PixelColor] {
        &self.pixels
    }

    /// The pixels as one `Vec` per row.
    pub fn rows(&self) -> Vec<Vec<PixelColor>> {
        self.pixels
            .chunks(self.size.columns() as usize)
            .map(<[PixelColor]>::to_vec)
            .collect()
    }

    /// Stage every pixel of the frame on `matrix`. Does not call
    /// [`show`](HardwareMatrix::show).
    pub fn write_to<M: HardwareMatrix + ?Sized>(&self, matrix: &mut M) {
        for p in self.size.bounds() {
            if let Some(i) = self.index(p) {
                matrix.set_pixel(p.x, p.y, self.pixels[i]);
            }
        }
    }
}

impl fmt::Display for Frame {
    /// One line per row, each pixel as `[num] r,g,b` (plus `,w` for RGBW).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for (row_num, row) in self.pixels.chunks(self.size.columns() as usize).enumerate() {
            if row_num > 0 {
                out.push('\n');
            }
            let base = row_num * row.len();
            for (col_num, color) in row.iter().enumerate() {
                out.push_str(&format!("[{:2}] {color}  ", base + col_num));
            }
        }
        f.write_str(out.trim_end())
    }
}

/// Composite `layers` over a `background` frame of `size`, in order. Each
/// layer is clipped to its own canvas size.
pub fn composite<'a, I>(size: MatrixSize, background: PixelColor, layers: I) -> Frame
where
    I: IntoIterator<Item = (TilePosition, &'a Canvas)>,
{
    let mut frame = Frame::new(size, background);
    for (position, canvas) in layers {
        frame.paint(position, canvas.size(), canvas);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::TileSize;
    use crate::matrix::VirtualMatrix;

    fn pos(x: i32, y: i32) -> TilePosition {
        TilePosition::new(x, y).unwrap()
    }

    fn canvas(cols: i32, rows: i32, color: PixelColor) -> Canvas {
        Canvas::new(TileSize::new(cols, rows).unwrap(), color)
    }

    #[test]
    fn layers_land_at_their_offsets() {
        let size = MatrixSize::new(8, 8).unwrap();
        let red = canvas(4, 4, PixelColor::rgb(128, 0, 0));
        let green = canvas(4, 4, PixelColor::rgb(0, 128, 0));
        let frame = composite(size, PixelColor::OFF, [(pos(0, 0), &red), (pos(4, 0), &green)]);
        assert_eq!(frame.at(0, 0), Some(PixelColor::rgb(128, 0, 0)));
        assert_eq!(frame.at(3, 3), Some(PixelColor::rgb(128, 0, 0)));
        assert_eq!(frame.at(4, 0), Some(PixelColor::rgb(0, 128, 0)));
        assert_eq!(frame.at(7, 3), Some(PixelColor::rgb(0, 128, 0)));
        assert_eq!(frame.at(7, 7), Some(PixelColor::OFF));
        assert_eq!(frame.at(0, 4), Some(PixelColor::OFF));
    }

    #[test]
    fn later_layer_wins_on_overlap() {
        let size = MatrixSize::new(4, 4).unwrap();
        let a = canvas(3, 3, PixelColor::rgb(1, 0, 0));
        let mut b = canvas(2, 2, PixelColor::rgb(0, 2, 0));
        b.set((0, 0), PixelColor::rgb(0, 0, 3));
        let frame = composite(size, PixelColor::OFF, [(pos(0, 0), &a), (pos(2, 2), &b)]);
        assert_eq!(frame.at(2, 2), Some(PixelColor::rgb(0, 0, 3)));
        assert_eq!(frame.at(1, 1), Some(PixelColor::rgb(1, 0, 0)));
        assert_eq!(frame.at(3, 3), Some(PixelColor::rgb(0, 2, 0)));

        let reversed = composite(size, PixelColor::OFF, [(pos(2, 2), &b), (pos(0, 0), &a)]);
        assert_eq!(reversed.at(2, 2), Some(PixelColor::rgb(1, 0, 0)));
    }

    #[test]
    fn paint_clips_to_matrix() {
        let mut frame = Frame::new(MatrixSize::new(4, 4).unwrap(), PixelColor::OFF);
        let c = canvas(3, 3, PixelColor::rgb(5, 5, 5));
        assert_eq!(frame.paint(pos(2, 2), c.size(), &c), 4);
        assert_eq!(frame.as_slice().iter().filter(|p| **p != PixelColor::OFF).count(), 4);
    }

    #[test]
    fn paint_clips_to_placement() {
        let mut frame = Frame::new(MatrixSize::new(4, 4).unwrap(), PixelColor::OFF);
        let big = canvas(4, 4, PixelColor::rgb(5, 5, 5));
        assert_eq!(frame.paint(pos(1, 1), TileSize::new(2, 1).unwrap(), &big), 2);
        assert_eq!(frame.at(1, 1), Some(PixelColor::rgb(5, 5, 5)));
        assert_eq!(frame.at(2, 1), Some(PixelColor::rgb(5, 5, 5)));
        assert_eq!(frame.at(3, 1), Some(PixelColor::OFF));
        assert_eq!(frame.at(1, 2), Some(PixelColor::OFF));

        let small = canvas(1, 1, PixelColor::rgb(6, 6, 6));
        assert_eq!(frame.paint(pos(0, 0), TileSize::new(3, 3).unwrap(), &small), 1);
        assert_eq!(frame.at(1, 0), Some(PixelColor::OFF));
    }

    #[test]
    fn write_to_stages_every_pixel() {
        let size = MatrixSize::new(3, 2).unwrap();
        let c = canvas(1, 1, PixelColor::rgb(9, 8, 7));
        let frame = composite(size, PixelColor::OFF, [(pos(2, 1), &c)]);
        let mut m = VirtualMatrix::new(size);
        frame.write_to(&mut m);
        assert_eq!(m.write_count(), 6);
        m.show().unwrap();
        assert_eq!(m.pixel(2, 1), Some(PixelColor::rgb(9, 8, 7)));
        assert_eq!(m.shown(), frame.as_slice());
    }

    #[test]
    fn display_matches_text_dump() {
        let size = MatrixSize::new(3, 2).unwrap();
        let empty = Frame::new(size, PixelColor::OFF);
        assert_eq!(
            empty.to_string(),
            "[ 0]   0,  0,  0  [ 1]   0,  0,  0  [ 2]   0,  0,  0  \n\
             [ 3]   0,  0,  0  [ 4]   0,  0,  0  [ 5]   0,  0,  0"
        );

        let rgbw = Frame::new(size, PixelColor::rgbw(128, 1, 2, 3));
        assert_eq!(
            rgbw.to_string(),
            "[ 0] 128,  1,  2,  3  [ 1] 128,  1,  2,  3  [ 2] 128,  1,  2,  3  \n\
             [ 3] 128,  1,  2,  3  [ 4] 128,  1,  2,  3  [ 5] 128,  1,  2,  3"
        );
    }
}
