//! Mapping matrix `(column, row)` coordinates onto the flat index of an LED
//! strip folded into a grid.

use neotiles_core::{MatrixSize, TileError};

/// How a strip is folded through one panel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Wiring {
    /// Every row runs left to right.
    #[default]
    RowMajor,
    /// Even rows run left to right, odd rows right to left.
    SerpentineRows,
    /// Every column runs top to bottom.
    ColumnMajor,
    /// Even columns run top to bottom, odd columns bottom to top.
    SerpentineColumns,
}

impl Wiring {
    /// Index of `(column, row)` within one `columns x rows` panel. The
    /// coordinates must be inside the panel.
    #[inline]
    fn index(self, column: usize, row: usize, columns: usize, rows: usize) -> usize {
        match self {
            Self::RowMajor => row * columns + column,
            Self::SerpentineRows if row % 2 == 1 => row * columns + (columns - 1 - column),
            Self::SerpentineRows => row * columns + column,
            Self::ColumnMajor => column * rows + row,
            Self::SerpentineColumns if column % 2 == 1 => column * rows + (rows - 1 - row),
            Self::SerpentineColumns => column * rows + row,
        }
    }
}

/// One or more identical panels, chained left to right along a single strip.
///
/// The first panel's pixels come first on the strip, then the second
/// panel's, and so on. Inside each panel the strip follows the [`Wiring`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "LayoutConfig")
)]
pub struct StripLayout {
    panel: MatrixSize,
    panels: i32,
    wiring: Wiring,
}

impl StripLayout {
    /// A single panel.
    pub fn new(panel: MatrixSize, wiring: Wiring) -> Self {
        Self {
            panel,
            panels: 1,
            wiring,
        }
    }

    /// `panels` copies of `panel` chained left to right.
    pub fn chained(panel: MatrixSize, wiring: Wiring, panels: i32) -> Result<Self, TileError> {
        if panels < 1 {
            return Err(TileError::InvalidGeometry(format!(
                "panel chain must hold at least one panel, got {panels}"
            )));
        }
        let columns = panel.columns().checked_mul(panels).ok_or_else(|| {
            TileError::InvalidGeometry(format!("{panels} panels of {panel} is too wide"))
        })?;
        MatrixSize::new(columns, panel.rows())?;
        Ok(Self {
            panel,
            panels,
            wiring,
        })
    }

    /// The size of the whole chain.
    pub fn size(&self) -> MatrixSize {
        MatrixSize::new(self.panel.columns() * self.panels, self.panel.rows())
            .unwrap_or(self.panel)
    }

    pub fn panel(&self) -> MatrixSize {
        self.panel
    }

    pub fn panels(&self) -> i32 {
        self.panels
    }

    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    /// Number of pixels on the strip.
    pub fn len(&self) -> usize {
        self.size().pixel_count()
    }

    /// Strip index of `(column, row)`, or `None` outside the chain.
    pub fn index(&self, column: i32, row: i32) -> Option<usize> {
        let cols = self.panel.columns();
        let rows = self.panel.rows();
        if column < 0 || row < 0 || row >= rows || column >= cols * self.panels {
            return None;
        }
        let (panel, local) = ((column / cols) as usize, (column % cols) as usize);
        let offset = panel * self.panel.pixel_count();
        Some(offset + self.wiring.index(local, row as usize, cols as usize, rows as usize))
    }
}

/// A layout as written in config; checked by [`StripLayout::chained`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct LayoutConfig {
    panel: MatrixSize,
    #[serde(default = "LayoutConfig::one")]
    panels: i32,
    #[serde(default)]
    wiring: Wiring,
}

#[cfg(feature = "serde")]
impl LayoutConfig {
    fn one() -> i32 {
        1
    }
}

#[cfg(feature = "serde")]
impl TryFrom<LayoutConfig> for StripLayout {
    type Error = TileError;

    fn try_from(c: LayoutConfig) -> Result<Self, TileError> {
        Self::chained(c.panel, c.wiring, c.panels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(c: i32, r: i32) -> MatrixSize {
        MatrixSize::new(c, r).unwrap()
    }

    /// Strip indices laid out as the matrix, one `Vec` per row.
    fn grid(layout: &StripLayout) -> Vec<Vec<usize>> {
        let size = layout.size();
        (0..size.rows())
            .map(|r| {
                (0..size.columns())
                    .map(|c| layout.index(c, r).unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn row_major() {
        let l = StripLayout::new(panel(3, 2), Wiring::RowMajor);
        assert_eq!(grid(&l), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn serpentine_rows() {
        let l = StripLayout::new(panel(3, 3), Wiring::SerpentineRows);
        assert_eq!(grid(&l), vec![vec![0, 1, 2], vec![5, 4, 3], vec![6, 7, 8]]);
    }

    #[test]
    fn column_major() {
        let l = StripLayout::new(panel(3, 2), Wiring::ColumnMajor);
        assert_eq!(grid(&l), vec![vec![0, 2, 4], vec![1, 3, 5]]);
    }

    #[test]
    fn serpentine_columns() {
        let l = StripLayout::new(panel(3, 2), Wiring::SerpentineColumns);
        assert_eq!(grid(&l), vec![vec![0, 3, 4], vec![1, 2, 5]]);
    }

    #[test]
    fn chained_panels_follow_each_other() {
        let l = StripLayout::chained(panel(2, 2), Wiring::RowMajor, 3).unwrap();
        assert_eq!(l.size(), panel(6, 2));
        assert_eq!(l.len(), 12);
        assert_eq!(
            grid(&l),
            vec![vec![0, 1, 4, 5, 8, 9], vec![2, 3, 6, 7, 10, 11]]
        );
    }

    #[test]
    fn every_pixel_maps_to_a_distinct_index() {
        for wiring in [
            Wiring::RowMajor,
            Wiring::SerpentineRows,
            Wiring::ColumnMajor,
            Wiring::SerpentineColumns,
        ] {
            let l = StripLayout::chained(panel(4, 3), wiring, 2).unwrap();
            let mut seen: Vec<usize> = grid(&l).into_iter().flatten().collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..l.len()).collect::<Vec<_>>(), "{wiring:?}");
        }
    }

    #[test]
    fn outside_is_unmapped() {
        let l = StripLayout::new(panel(3, 2), Wiring::SerpentineRows);
        assert_eq!(l.index(3, 0), None);
        assert_eq!(l.index(0, 2), None);
        assert_eq!(l.index(-1, 0), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn layout_reads_from_config() {
        let l: StripLayout = serde_json::from_str(
            r#"{"panel":[8,8],"panels":2,"wiring":"SerpentineRows"}"#,
        )
        .unwrap();
        assert_eq!(l.size(), panel(16, 8));
        assert_eq!(l.index(8, 1), Some(64 + 15));
        assert!(serde_json::from_str::<StripLayout>(r#"{"panel":[0,8],"panels":1,"wiring":"RowMajor"}"#).is_err());

        let single: StripLayout = serde_json::from_str(r#"{"panel":[4,2]}"#).unwrap();
        assert_eq!(single, StripLayout::new(panel(4, 2), Wiring::RowMajor));
        let text = serde_json::to_string(&l).unwrap();
        assert_eq!(serde_json::from_str::<StripLayout>(&text).unwrap(), l);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_cannot_skip_chain_checks() {
        for bad in [
            r#"{"panel":[8,8],"panels":-1,"wiring":"RowMajor"}"#,
            r#"{"panel":[8,8],"panels":0,"wiring":"RowMajor"}"#,
            r#"{"panel":[8,8],"panels":2147483647,"wiring":"RowMajor"}"#,
        ] {
            assert!(serde_json::from_str::<StripLayout>(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn empty_chain_is_rejected() {
        assert!(matches!(
            StripLayout::chained(panel(2, 2), Wiring::RowMajor, 0),
            Err(TileError::InvalidGeometry(_))
        ));
        assert!(StripLayout::chained(panel(2, 2), Wiring::RowMajor, -1).is_err());
    }

    #[test]
    fn oversized_chain_is_rejected() {
        assert!(matches!(
            StripLayout::chained(panel(2, 2), Wiring::RowMajor, i32::MAX),
            Err(TileError::InvalidGeometry(_))
        ));
    }
}
