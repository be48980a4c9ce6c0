//! Bounding-box scan over the whole input tree.
//!
//! Tile sets are often sparse: row 0 may stop at column 2 while row 40 runs to
//! column 5. The only way to get a rectangular, non-jagged output is to list
//! every row before emitting anything, so the scan walks the full tree once
//! and folds all indices into a single bounding box.

use std::path::{Path, PathBuf};

use image::{ImageError, ImageReader};
use tracing::{info, warn};

use super::{Grid, ScanError};
use crate::coord::{widen, GridBounds, IndexRange};
use crate::locator::{list_columns, list_rows, ColumnMap};

/// Scans an input directory into a [`Grid`].
///
/// # Example
///
/// ```no_run
/// use tilestitch::grid::GridScanner;
///
/// let grid = GridScanner::new("tiles").scan()?;
/// println!("{} cells of {}px", grid.cell_count(), grid.tile_edge());
/// # Ok::<(), tilestitch::grid::ScanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GridScanner {
    root: PathBuf,
}

impl GridScanner {
    /// Create a scanner for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Scan the tree and compute the grid.
    ///
    /// # Errors
    ///
    /// - [`ScanError::RootUnreadable`] if the root cannot be listed
    /// - [`ScanError::EmptyGrid`] if no numeric rows or no numeric tiles exist
    /// - [`ScanError::NoReadableTile`] if the reference tile has no readable header
    pub fn scan(&self) -> Result<Grid, ScanError> {
        let rows = list_rows(&self.root).map_err(|source| ScanError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;

        if rows.is_empty() {
            return Err(ScanError::EmptyGrid(format!(
                "no numeric row directories in {}",
                self.root.display()
            )));
        }

        let extent = rows
            .iter()
            .fold(Extent::default(), |extent, (&row, dir)| {
                extent.with_row(row, list_columns(dir))
            });

        let (Some(row_range), Some(col_range), Some(reference)) =
            (extent.rows, extent.cols, extent.reference)
        else {
            return Err(ScanError::EmptyGrid(format!(
                "no numeric tile files under {}",
                self.root.display()
            )));
        };

        let tile_edge = read_tile_edge(&reference)?;
        let bounds = GridBounds::new(row_range, col_range);

        info!(
            root = %self.root.display(),
            row_dirs = rows.len(),
            tiles = extent.tile_count,
            bounds = %bounds,
            tile_edge,
            "Grid scanned"
        );

        Ok(Grid::new(bounds, tile_edge, rows, reference))
    }
}

/// Convenience wrapper for `GridScanner::new(root).scan()`.
pub fn scan(root: &Path) -> Result<Grid, ScanError> {
    GridScanner::new(root).scan()
}

/// Running fold state for the scan.
#[derive(Debug, Default)]
struct Extent {
    rows: Option<IndexRange>,
    cols: Option<IndexRange>,
    reference: Option<PathBuf>,
    tile_count: usize,
}

impl Extent {
    fn with_row(self, row: u32, columns: ColumnMap) -> Self {
        let cols = columns.keys().fold(self.cols, |range, &col| widen(range, col));
        let reference = self
            .reference
            .or_else(|| columns.values().next().map(|tile| tile.path().to_path_buf()));

        Self {
            rows: widen(self.rows, row),
            cols,
            reference,
            tile_count: self.tile_count + columns.len(),
        }
    }
}

/// Read the reference tile's width from its header without decoding pixels.
fn read_tile_edge(path: &Path) -> Result<u32, ScanError> {
    let dimensions = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::from)
        .and_then(|reader| reader.into_dimensions());

    match dimensions {
        Ok((width, height)) if width > 0 => {
            if width != height {
                warn!(
                    path = %path.display(),
                    width,
                    height,
                    "Reference tile is not square, using its width as tile edge"
                );
            }
            Ok(width)
        }
        Ok(_) => Err(ScanError::NoReadableTile {
            path: path.to_path_buf(),
            reason: "image has zero width".to_string(),
        }),
        Err(e) => Err(ScanError::NoReadableTile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
