//! Mosaic output writers.
//!
//! The streamer produces tiles; a [`MosaicWriter`] consumes them. Writers are
//! interchangeable behind the trait, and the merge facade picks one from the
//! output path and the configured [`WriterChoice`].
//!
//! ```text
//! ┌──────────────────┐
//! │ RowMajorStreamer │  Iterator<Item = PixelBuffer>
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  MosaicWriter    │ (trait)
//! └────────┬─────────┘
//!          │
//!     ┌────┴─────┐
//!     ▼          ▼
//! ┌─────────┐ ┌────────┐
//! │TiledTiff│ │ Canvas │
//! │ Writer  │ │ Writer │
//! └─────────┘ └────────┘
//! ```
//!
//! # Available Writers
//!
//! - [`TiledTiffWriter`] - Streaming BigTIFF, constant memory, `.tif`/`.tiff`
//! - [`CanvasWriter`] - Whole image in memory, any format the `image` crate saves

mod canvas;
mod error;
mod tiled;
mod writer;

pub use canvas::CanvasWriter;
pub use error::WriteError;
pub use tiled::{
    CompressionMethod, TiffCompression, TiledTiffWriter, DEFAULT_COMPRESSION_LEVEL,
    MAX_COMPRESSION_LEVEL,
};
pub use writer::MosaicWriter;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::format_size;
use crate::grid::Grid;

/// Samples per pixel of every output.
const CHANNELS: u16 = 3;

/// Declared shape of the assembled image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicLayout {
    tile_edge: u32,
    tile_rows: u32,
    tile_cols: u32,
}

impl MosaicLayout {
    /// Create a layout of `tile_rows × tile_cols` tiles of `tile_edge` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::InvalidLayout`] if any dimension is zero or the
    /// pixel width or height does not fit in `u32`.
    pub fn new(tile_edge: u32, tile_rows: u32, tile_cols: u32) -> Result<Self, WriteError> {
        if tile_edge == 0 || tile_rows == 0 || tile_cols == 0 {
            return Err(WriteError::InvalidLayout(format!(
                "zero dimension: edge {}, {} rows, {} cols",
                tile_edge, tile_rows, tile_cols
            )));
        }
        if tile_edge.checked_mul(tile_cols).is_none() || tile_edge.checked_mul(tile_rows).is_none()
        {
            return Err(WriteError::InvalidLayout(format!(
                "{}×{} tiles of {}px exceed the maximum image dimension",
                tile_cols, tile_rows, tile_edge
            )));
        }
        Ok(Self {
            tile_edge,
            tile_rows,
            tile_cols,
        })
    }

    /// Layout covering the whole bounding box of a scanned grid.
    pub fn from_grid(grid: &Grid) -> Result<Self, WriteError> {
        let bounds = grid.bounds();
        let rows = u32::try_from(bounds.row_count()).map_err(|_| {
            WriteError::InvalidLayout(format!("{} tile rows", bounds.row_count()))
        })?;
        let cols = u32::try_from(bounds.col_count()).map_err(|_| {
            WriteError::InvalidLayout(format!("{} tile columns", bounds.col_count()))
        })?;
        Self::new(grid.tile_edge(), rows, cols)
    }

    /// Edge length of each tile in pixels.
    pub fn tile_edge(&self) -> u32 {
        self.tile_edge
    }

    /// Number of tile rows.
    pub fn tile_rows(&self) -> u32 {
        self.tile_rows
    }

    /// Number of tile columns.
    pub fn tile_cols(&self) -> u32 {
        self.tile_cols
    }

    /// Samples per pixel.
    pub fn channels(&self) -> u16 {
        CHANNELS
    }

    /// Total number of tiles.
    pub fn tile_count(&self) -> u64 {
        u64::from(self.tile_rows) * u64::from(self.tile_cols)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.tile_edge * self.tile_cols
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.tile_edge * self.tile_rows
    }

    /// Uncompressed size of the full image in bytes.
    pub fn raw_size(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height()) * u64::from(CHANNELS)
    }

    /// Pixel origin `(x, y)` of the tile at row-major `index`.
    pub fn tile_origin(&self, index: u64) -> Option<(u32, u32)> {
        if index >= self.tile_count() {
            return None;
        }
        let cols = u64::from(self.tile_cols);
        let col = u32::try_from(index % cols).ok()?;
        let row = u32::try_from(index / cols).ok()?;
        Some((col * self.tile_edge, row * self.tile_edge))
    }
}

impl fmt::Display for MosaicLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}×{} px ({}×{} tiles of {}px, {} raw)",
            self.width(),
            self.height(),
            self.tile_cols,
            self.tile_rows,
            self.tile_edge,
            format_size(self.raw_size())
        )
    }
}

/// Which writer to use for an output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterChoice {
    /// Tiled TIFF for `.tif`/`.tiff`, canvas for everything else.
    #[default]
    Auto,
    /// Always the streaming tiled TIFF writer.
    Tiled,
    /// Always the in-memory canvas.
    Canvas,
}

impl WriterChoice {
    /// Configuration name of the choice.
    pub fn as_str(&self) -> &'static str {
        match self {
            WriterChoice::Auto => "auto",
            WriterChoice::Tiled => "tiled",
            WriterChoice::Canvas => "canvas",
        }
    }

    /// Whether the tiled writer should handle `path`.
    ///
    /// Returns `None` when the choice cannot produce this path: `Tiled`
    /// with a non-TIFF extension.
    pub fn uses_tiled(&self, path: &Path) -> Option<bool> {
        match self {
            WriterChoice::Auto => Some(is_tiff_path(path)),
            WriterChoice::Tiled => is_tiff_path(path).then_some(true),
            WriterChoice::Canvas => Some(false),
        }
    }
}

impl fmt::Display for WriterChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WriterChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(WriterChoice::Auto),
            "tiled" => Ok(WriterChoice::Tiled),
            "canvas" => Ok(WriterChoice::Canvas),
            other => Err(format!(
                "unknown writer '{}', expected auto, tiled or canvas",
                other
            )),
        }
    }
}

/// Whether the path has a `.tif` or `.tiff` extension, any case.
pub fn is_tiff_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false)
}
