//! Geometry primitives: [`Point`] and [`Range`] for global matrix
//! coordinates, plus the extent and offset types tiles are placed with
//! ([`MatrixSize`], [`TileSize`], [`TilePosition`], [`PixelPosition`]).

use std::fmt;
use std::ops::Add;

use crate::error::TileError;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A 2D integer point. X grows right (columns), Y grows down (rows).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open rectangle \[min, max). `min` is inclusive, `max` is exclusive.
///
/// Placements of tiles inside the matrix are expressed as ranges in global
/// coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub min: Point,
    pub max: Point,
}

impl Range {
    /// Create a new range from two corners, canonicalized so that
    /// `min` <= `max` on each axis.
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Width of the range.
    #[inline]
    pub fn width(self) -> i32 {
        self.max.x - self.min.x
    }

    /// Height of the range.
    #[inline]
    pub fn height(self) -> i32 {
        self.max.y - self.min.y
    }

    /// Total number of pixels in the range.
    #[inline]
    pub fn len(self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.width() as usize) * (self.height() as usize)
    }

    /// Whether the range has zero or negative area.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Whether `p` is inside the half-open range.
    #[inline]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Reports whether range `self` is completely contained in range `r`.
    ///
    /// Empty ranges are always considered "in" any range.
    #[inline]
    pub fn in_range(self, r: Range) -> bool {
        if self.is_empty() {
            return true;
        }
        self.intersect(r) == self
    }

    /// Intersection of two ranges. Returns the zero range when they do not
    /// overlap.
    #[inline]
    pub fn intersect(self, other: Range) -> Self {
        let r = Self {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        };
        if r.is_empty() { Self::default() } else { r }
    }

    /// Whether the two ranges overlap (non-empty intersection).
    #[inline]
    pub fn overlaps(self, other: Range) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Row-major iterator over every point in the range.
    #[inline]
    pub fn iter(self) -> RangeIter {
        RangeIter {
            range: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl IntoIterator for Range {
    type Item = Point;
    type IntoIter = RangeIter;
    #[inline]
    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl Add<Point> for Range {
    type Output = Range;

    #[inline]
    fn add(self, p: Point) -> Range {
        Range {
            min: self.min + p,
            max: self.max + p,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{})", self.min, self.max)
    }
}

/// Row-major iterator over the points in a [`Range`].
#[derive(Clone, Debug)]
pub struct RangeIter {
    range: Range,
    next: usize,
    len: usize,
}

impl Iterator for RangeIter {
    type Item = Point;

    #[inline]
    fn next(&mut self) -> Option<Point> {
        if self.next >= self.len {
            return None;
        }
        let w = self.range.width() as usize;
        let (dx, dy) = (self.next % w, self.next / w);
        self.next += 1;
        Some(Point::new(self.range.min.x + dx as i32, self.range.min.y + dy as i32))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RangeIter {}

// ---------------------------------------------------------------------------
// MatrixSize / TileSize
// ---------------------------------------------------------------------------

fn check_extent(what: &str, columns: i32, rows: i32) -> Result<(), TileError> {
    if columns <= 0 || rows <= 0 {
        return Err(TileError::InvalidGeometry(format!(
            "{what} must be positive, got {columns}x{rows}"
        )));
    }
    Ok(())
}

/// Size (in columns and rows) of the physical matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "(i32, i32)", into = "(i32, i32)")
)]
pub struct MatrixSize {
    columns: i32,
    rows: i32,
}

impl MatrixSize {
    /// Create a matrix size. Fails with [`TileError::InvalidGeometry`] unless
    /// both components are positive.
    pub fn new(columns: i32, rows: i32) -> Result<Self, TileError> {
        check_extent("matrix size", columns, rows)?;
        Ok(Self { columns, rows })
    }

    #[inline]
    pub const fn columns(self) -> i32 {
        self.columns
    }

    #[inline]
    pub const fn rows(self) -> i32 {
        self.rows
    }

    /// Number of pixels in the matrix.
    #[inline]
    pub const fn pixel_count(self) -> usize {
        (self.columns as usize) * (self.rows as usize)
    }

    /// The whole matrix as a global range.
    #[inline]
    pub fn bounds(self) -> Range {
        Range::new(0, 0, self.columns, self.rows)
    }
}

impl TryFrom<(i32, i32)> for MatrixSize {
    type Error = TileError;

    fn try_from((columns, rows): (i32, i32)) -> Result<Self, TileError> {
        Self::new(columns, rows)
    }
}

impl From<MatrixSize> for (i32, i32) {
    fn from(s: MatrixSize) -> Self {
        (s.columns, s.rows)
    }
}

impl fmt::Display for MatrixSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

/// Size (in columns and rows) of a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "(i32, i32)", into = "(i32, i32)")
)]
pub struct TileSize {
    columns: i32,
    rows: i32,
}

impl TileSize {
    /// The size every tile has before it is registered.
    pub const UNIT: Self = Self {
        columns: 1,
        rows: 1,
    };

    /// Create a tile size. Fails with [`TileError::InvalidGeometry`] unless
    /// both components are positive.
    pub fn new(columns: i32, rows: i32) -> Result<Self, TileError> {
        check_extent("tile size", columns, rows)?;
        Ok(Self { columns, rows })
    }

    #[inline]
    pub const fn columns(self) -> i32 {
        self.columns
    }

    #[inline]
    pub const fn rows(self) -> i32 {
        self.rows
    }

    /// Number of pixels in a tile of this size.
    #[inline]
    pub const fn pixel_count(self) -> usize {
        (self.columns as usize) * (self.rows as usize)
    }

    /// The tile's local range, `[0, columns) x [0, rows)`.
    #[inline]
    pub fn local_bounds(self) -> Range {
        Range::new(0, 0, self.columns, self.rows)
    }
}

impl Default for TileSize {
    fn default() -> Self {
        Self::UNIT
    }
}

impl TryFrom<(i32, i32)> for TileSize {
    type Error = TileError;

    fn try_from((columns, rows): (i32, i32)) -> Result<Self, TileError> {
        Self::new(columns, rows)
    }
}

impl From<TileSize> for (i32, i32) {
    fn from(s: TileSize) -> Self {
        (s.columns, s.rows)
    }
}

impl fmt::Display for TileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

// ---------------------------------------------------------------------------
// TilePosition / PixelPosition
// ---------------------------------------------------------------------------

/// Global offset of a tile's top-left pixel within the matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "(i32, i32)", into = "(i32, i32)")
)]
pub struct TilePosition {
    x: i32,
    y: i32,
}

impl TilePosition {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a tile position. Negative components fail with
    /// [`TileError::InvalidGeometry`].
    pub fn new(x: i32, y: i32) -> Result<Self, TileError> {
        if x < 0 || y < 0 {
            return Err(TileError::InvalidGeometry(format!(
                "tile position must not be negative, got ({x}, {y})"
            )));
        }
        Ok(Self { x, y })
    }

    #[inline]
    pub const fn x(self) -> i32 {
        self.x
    }

    #[inline]
    pub const fn y(self) -> i32 {
        self.y
    }

    /// The global range covered by a tile of `size` placed here. The far
    /// edge saturates at `i32::MAX`.
    #[inline]
    pub fn placement(self, size: TileSize) -> Range {
        Range::new(
            self.x,
            self.y,
            self.x.saturating_add(size.columns()),
            self.y.saturating_add(size.rows()),
        )
    }

    /// Like [`placement`](Self::placement), but `None` if the far edge does
    /// not fit in an `i32`.
    #[inline]
    pub fn checked_placement(self, size: TileSize) -> Option<Range> {
        let x1 = self.x.checked_add(size.columns())?;
        let y1 = self.y.checked_add(size.rows())?;
        Some(Range::new(self.x, self.y, x1, y1))
    }

    /// Map a tile-local pixel to its global matrix point.
    #[inline]
    pub fn to_global(self, local: PixelPosition) -> Point {
        Point::new(self.x.saturating_add(local.x), self.y.saturating_add(local.y))
    }
}

impl TryFrom<(i32, i32)> for TilePosition {
    type Error = TileError;

    fn try_from((x, y): (i32, i32)) -> Result<Self, TileError> {
        Self::new(x, y)
    }
}

impl From<TilePosition> for (i32, i32) {
    fn from(p: TilePosition) -> Self {
        (p.x, p.y)
    }
}

impl From<TilePosition> for Point {
    fn from(p: TilePosition) -> Self {
        Point::new(p.x, p.y)
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Offset of a pixel within a tile, relative to the tile's own (0, 0).
///
/// Any value is representable; positions outside the tile are ignored by
/// the canvas rather than rejected.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelPosition {
    pub x: i32,
    pub y: i32,
}

impl PixelPosition {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelPosition {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<PixelPosition> for (i32, i32) {
    fn from(p: PixelPosition) -> Self {
        (p.x, p.y)
    }
}

impl From<Point> for PixelPosition {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl fmt::Display for PixelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_basics() {
        let r = Range::new(0, 0, 3, 2);
        assert_eq!(r.width(), 3);
        assert_eq!(r.height(), 2);
        assert_eq!(r.len(), 6);
        assert!(r.contains(Point::new(2, 1)));
        assert!(!r.contains(Point::new(3, 0)));
        assert!(!r.contains(Point::new(0, 2)));
    }

    #[test]
    fn range_iter_is_row_major() {
        let pts: Vec<_> = Range::new(1, 1, 3, 3).iter().collect();
        assert_eq!(
            pts,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(1, 2),
                Point::new(2, 2)
            ]
        );
        assert_eq!(Range::new(0, 0, 4, 5).iter().len(), 20);
    }

    #[test]
    fn range_overlap_and_containment() {
        let matrix = Range::new(0, 0, 8, 8);
        let a = Range::new(0, 0, 4, 4);
        let b = Range::new(4, 0, 8, 4);
        let c = Range::new(3, 3, 5, 5);
        assert!(a.in_range(matrix));
        assert!(!Range::new(6, 6, 9, 8).in_range(matrix));
        assert!(!a.overlaps(b));
        assert!(a.overlaps(c));
        assert!(b.overlaps(c));
        assert_eq!(a.intersect(b), Range::default());
    }

    #[test]
    fn sizes_reject_non_positive_extents() {
        assert!(TileSize::new(4, 4).is_ok());
        assert!(matches!(
            TileSize::new(0, 4),
            Err(TileError::InvalidGeometry(_))
        ));
        assert!(matches!(
            TileSize::new(4, -1),
            Err(TileError::InvalidGeometry(_))
        ));
        assert!(matches!(
            MatrixSize::new(0, 0),
            Err(TileError::InvalidGeometry(_))
        ));
        assert_eq!(MatrixSize::new(10, 5).unwrap().pixel_count(), 50);
    }

    #[test]
    fn positions_reject_negative_offsets() {
        assert!(TilePosition::new(0, 0).is_ok());
        assert!(matches!(
            TilePosition::new(-1, 0),
            Err(TileError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn pair_conversions() {
        let size = TileSize::try_from((8, 4)).unwrap();
        assert_eq!(<(i32, i32)>::from(size), (8, 4));
        let pos: (i32, i32) = TilePosition::new(2, 3).unwrap().into();
        assert_eq!(pos, (2, 3));
        assert_eq!(PixelPosition::from((1, 2)), PixelPosition::new(1, 2));
        assert!(TileSize::try_from((3, 0)).is_err());
    }

    #[test]
    fn placement_maps_local_to_global() {
        let pos = TilePosition::new(4, 2).unwrap();
        let size = TileSize::new(3, 2).unwrap();
        assert_eq!(pos.placement(size), Range::new(4, 2, 7, 4));
        assert_eq!(pos.to_global(PixelPosition::new(2, 1)), Point::new(6, 3));
        assert_eq!(pos.checked_placement(size), Some(pos.placement(size)));
    }

    #[test]
    fn placement_near_i32_max_does_not_wrap() {
        let pos = TilePosition::new(i32::MAX - 1, 0).unwrap();
        let size = TileSize::new(3, 1).unwrap();
        assert_eq!(pos.checked_placement(size), None);
        assert_eq!(pos.placement(size), Range::new(i32::MAX - 1, 0, i32::MAX, 1));
        assert_eq!(
            pos.to_global(PixelPosition::new(5, 0)),
            Point::new(i32::MAX, 0)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_validates_extents() {
        let size: TileSize = serde_json::from_str("[4,2]").unwrap();
        assert_eq!(size, TileSize::new(4, 2).unwrap());
        assert!(serde_json::from_str::<TileSize>("[0,2]").is_err());
        assert_eq!(serde_json::to_string(&size).unwrap(), "[4,2]");
    }
}
