//! MosaicWriter trait and the checks shared by its implementations.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::{MosaicLayout, WriteError};
use crate::tile::PixelBuffer;

/// Trait for consumers of the row-major tile sequence.
///
/// A writer is told the final layout up front and then pulls exactly
/// `layout.tile_count()` buffers, in row-major order, from `tiles`. The
/// sequence is consumed lazily so a streaming implementation never holds
/// more than one tile in memory.
///
/// # Implementors
///
/// - [`TiledTiffWriter`](super::TiledTiffWriter) - Streams tiles into a tiled BigTIFF
/// - [`CanvasWriter`](super::CanvasWriter) - Pastes tiles onto an in-memory canvas
pub trait MosaicWriter {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    /// Write the mosaic to `path`, returning the number of tiles written.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::TileCountMismatch`] if the sequence is shorter
    /// or longer than the layout declares, [`WriteError::TileShapeMismatch`]
    /// for a wrongly sized buffer, and I/O or encoder errors otherwise. No
    /// partial file is left behind on error.
    fn write(
        &self,
        path: &Path,
        layout: &MosaicLayout,
        tiles: &mut dyn Iterator<Item = PixelBuffer>,
    ) -> Result<u64, WriteError>;
}

/// Pull the tile at `index` and check its shape.
pub(crate) fn next_tile(
    tiles: &mut dyn Iterator<Item = PixelBuffer>,
    index: u64,
    layout: &MosaicLayout,
) -> Result<PixelBuffer, WriteError> {
    let tile = tiles.next().ok_or(WriteError::TileCountMismatch {
        expected: layout.tile_count(),
        actual: index,
    })?;

    let edge = layout.tile_edge();
    if tile.width() != edge || tile.height() != edge {
        return Err(WriteError::TileShapeMismatch {
            index,
            expected: edge,
            width: tile.width(),
            height: tile.height(),
        });
    }
    Ok(tile)
}

/// Fail if the sequence still has tiles after the declared count.
pub(crate) fn ensure_exhausted(
    tiles: &mut dyn Iterator<Item = PixelBuffer>,
    layout: &MosaicLayout,
) -> Result<(), WriteError> {
    match tiles.next() {
        Some(_) => Err(WriteError::TileCountMismatch {
            expected: layout.tile_count(),
            actual: layout.tile_count() + 1,
        }),
        None => Ok(()),
    }
}

/// Best-effort removal of a partially written output.
pub(crate) fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove partial output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::blank_tile;
    use tempfile::TempDir;

    fn layout() -> MosaicLayout {
        MosaicLayout::new(4, 1, 2).unwrap()
    }

    #[test]
    fn test_next_tile_accepts_matching_shape() {
        let mut tiles = std::iter::once(blank_tile(4));
        assert!(next_tile(&mut tiles, 0, &layout()).is_ok());
    }

    #[test]
    fn test_next_tile_reports_short_sequence() {
        let mut tiles = std::iter::empty::<PixelBuffer>();
        let err = next_tile(&mut tiles, 1, &layout()).unwrap_err();
        assert!(matches!(
            err,
            WriteError::TileCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_next_tile_rejects_wrong_shape() {
        let mut tiles = std::iter::once(blank_tile(8));
        let err = next_tile(&mut tiles, 0, &layout()).unwrap_err();
        assert!(matches!(err, WriteError::TileShapeMismatch { width: 8, .. }));
    }

    #[test]
    fn test_ensure_exhausted() {
        let mut empty = std::iter::empty::<PixelBuffer>();
        assert!(ensure_exhausted(&mut empty, &layout()).is_ok());

        let mut extra = std::iter::once(blank_tile(4));
        let err = ensure_exhausted(&mut extra, &layout()).unwrap_err();
        assert!(matches!(
            err,
            WriteError::TileCountMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_remove_partial() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.tif");
        std::fs::write(&path, b"partial").unwrap();

        remove_partial(&path);
        assert!(!path.exists());

        // Missing file is not an error.
        remove_partial(&path);
    }
}
