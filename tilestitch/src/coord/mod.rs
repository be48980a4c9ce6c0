//! Grid coordinate types.
//!
//! Tiles on disk are addressed by a `(row, col)` pair parsed from the
//! `<row>/<col>.<ext>` directory layout. This module provides the coordinate
//! type itself plus the inclusive index ranges used to describe the grid's
//! bounding box.
//!
//! # Example
//!
//! ```
//! use tilestitch::coord::{GridBounds, GridCoord, IndexRange};
//!
//! let bounds = GridBounds::new(IndexRange::new(0, 1).unwrap(), IndexRange::new(3, 5).unwrap());
//! assert_eq!(bounds.cell_count(), 6);
//!
//! let first = bounds.coords().next().unwrap();
//! assert_eq!(first, GridCoord::new(0, 3));
//! ```

use std::fmt;
use std::ops::RangeInclusive;

/// A single cell of the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Row index (name of the row directory).
    pub row: u32,
    /// Column index (stem of the tile file).
    pub col: u32,
}

impl GridCoord {
    /// Create a new grid coordinate.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// An inclusive, non-empty range of grid indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    min: u32,
    max: u32,
}

impl IndexRange {
    /// Create a range covering `min..=max`.
    ///
    /// Returns `None` when `max < min`.
    pub fn new(min: u32, max: u32) -> Option<Self> {
        (max >= min).then_some(Self { min, max })
    }

    /// A range covering exactly one index.
    pub fn single(index: u32) -> Self {
        Self {
            min: index,
            max: index,
        }
    }

    /// Widen the range so that it covers `index`.
    #[must_use]
    pub fn include(self, index: u32) -> Self {
        Self {
            min: self.min.min(index),
            max: self.max.max(index),
        }
    }

    /// Smallest index in the range.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Largest index in the range.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of indices in the range.
    ///
    /// Returned as `u64` because `0..=u32::MAX` holds 2^32 indices.
    pub fn len(&self) -> u64 {
        u64::from(self.max - self.min) + 1
    }

    /// Ranges are never empty; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the indices in ascending order.
    pub fn iter(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }
}

/// Fold helper used while scanning: `None` means "nothing seen yet".
pub(crate) fn widen(range: Option<IndexRange>, index: u32) -> Option<IndexRange> {
    Some(match range {
        Some(r) => r.include(index),
        None => IndexRange::single(index),
    })
}

/// Bounding box of the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    rows: IndexRange,
    cols: IndexRange,
}

impl GridBounds {
    /// Create bounds from a row range and a column range.
    pub fn new(rows: IndexRange, cols: IndexRange) -> Self {
        Self { rows, cols }
    }

    /// Row index range.
    pub fn rows(&self) -> IndexRange {
        self.rows
    }

    /// Column index range.
    pub fn cols(&self) -> IndexRange {
        self.cols
    }

    /// Number of rows covered by the bounding box.
    pub fn row_count(&self) -> u64 {
        self.rows.len()
    }

    /// Number of columns covered by the bounding box.
    pub fn col_count(&self) -> u64 {
        self.cols.len()
    }

    /// Total number of cells (`row_count × col_count`).
    pub fn cell_count(&self) -> u64 {
        self.row_count() * self.col_count()
    }

    /// Iterate every coordinate, ascending row then ascending column.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> {
        let cols = self.cols;
        self.rows
            .iter()
            .flat_map(move |row| cols.iter().map(move |col| GridCoord::new(row, col)))
    }
}

impl fmt::Display for GridBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..={}, cols {}..={}",
            self.rows.min, self.rows.max, self.cols.min, self.cols.max
        )
    }
}
