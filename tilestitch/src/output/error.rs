//! Error types for mosaic output.

use std::io;

use thiserror::Error;

/// Errors that abort writing the assembled image.
///
/// Any of these leaves no output file behind: writers remove whatever they
/// had written before returning the error.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Creating, writing or flushing the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The TIFF encoder rejected a tag or directory.
    #[error("TIFF encoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The in-memory canvas could not be encoded or saved.
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// The tile sequence ended early or ran past the declared layout.
    ///
    /// On surplus tiles `actual` is `expected + 1`: writers stop pulling at
    /// the first extra tile.
    #[error("Tile count mismatch: layout declares {expected} tiles, sequence yielded {actual}")]
    TileCountMismatch { expected: u64, actual: u64 },

    /// A tile buffer does not have the declared edge length.
    #[error("Tile {index} is {width}×{height}, expected {expected}×{expected}")]
    TileShapeMismatch {
        index: u64,
        expected: u32,
        width: u32,
        height: u32,
    },

    /// The declared layout cannot be represented in the output format.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}
