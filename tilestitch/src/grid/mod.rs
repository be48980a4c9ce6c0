//! The scanned tile grid.
//!
//! A [`Grid`] is produced once by [`GridScanner::scan`] and never mutated. It
//! records the bounding box over every discovered row directory and tile
//! file, the common tile edge length, and where each row lives on disk.
//!
//! ```text
//!   root/
//!   ├── 0/  0.png 1.png          rows 0..=1
//!   └── 1/        1.png 5.png    cols 0..=5  (column 5 widens row 0 too)
//! ```

mod error;
mod scanner;

pub use error::ScanError;
pub use scanner::{scan, GridScanner};

use std::path::{Path, PathBuf};

use crate::coord::GridBounds;
use crate::locator::RowMap;

/// Immutable description of the tile grid.
#[derive(Debug, Clone)]
pub struct Grid {
    bounds: GridBounds,
    tile_edge: u32,
    rows: RowMap,
    reference_tile: PathBuf,
}

impl Grid {
    /// Assemble a grid from already validated parts.
    pub(crate) fn new(
        bounds: GridBounds,
        tile_edge: u32,
        rows: RowMap,
        reference_tile: PathBuf,
    ) -> Self {
        debug_assert!(tile_edge > 0);
        Self {
            bounds,
            tile_edge,
            rows,
            reference_tile,
        }
    }

    /// Bounding box over all rows and columns.
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Edge length of every tile in pixels.
    pub fn tile_edge(&self) -> u32 {
        self.tile_edge
    }

    /// All discovered row directories.
    pub fn rows(&self) -> &RowMap {
        &self.rows
    }

    /// Directory of the given row, if it exists.
    pub fn row_dir(&self, row: u32) -> Option<&Path> {
        self.rows.get(&row).map(PathBuf::as_path)
    }

    /// The tile whose header determined the tile edge.
    pub fn reference_tile(&self) -> &Path {
        &self.reference_tile
    }

    /// Number of cells the mosaic will contain.
    pub fn cell_count(&self) -> u64 {
        self.bounds.cell_count()
    }
}
