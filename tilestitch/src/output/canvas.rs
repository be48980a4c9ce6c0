//! In-memory canvas writer for non-TIFF outputs.

use std::path::Path;

use image::{imageops, RgbImage};
use tracing::{info, warn};

use super::writer::{ensure_exhausted, next_tile, remove_partial};
use super::{MosaicLayout, MosaicWriter, WriteError};
use crate::config::format_size;
use crate::tile::{PixelBuffer, FILLER};

/// Pastes every tile onto a full-size canvas and saves it by extension.
///
/// Memory use is the size of the whole image, so this is only picked for
/// formats the tiled writer cannot produce (PNG, JPEG, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasWriter;

impl CanvasWriter {
    /// Create a canvas writer.
    pub fn new() -> Self {
        Self
    }

    fn assemble(
        &self,
        layout: &MosaicLayout,
        tiles: &mut dyn Iterator<Item = PixelBuffer>,
    ) -> Result<RgbImage, WriteError> {
        let mut canvas = RgbImage::from_pixel(layout.width(), layout.height(), FILLER);

        for index in 0..layout.tile_count() {
            let tile = next_tile(tiles, index, layout)?;
            let (x, y) = layout.tile_origin(index).ok_or_else(|| {
                WriteError::InvalidLayout(format!("tile {} outside the layout", index))
            })?;
            imageops::replace(&mut canvas, &tile, i64::from(x), i64::from(y));
        }
        ensure_exhausted(tiles, layout)?;

        Ok(canvas)
    }
}

impl MosaicWriter for CanvasWriter {
    fn name(&self) -> &str {
        "canvas"
    }

    fn write(
        &self,
        path: &Path,
        layout: &MosaicLayout,
        tiles: &mut dyn Iterator<Item = PixelBuffer>,
    ) -> Result<u64, WriteError> {
        warn!(
            width = layout.width(),
            height = layout.height(),
            size = %format_size(layout.raw_size()),
            "Assembling the full image in memory; use a .tif output for large mosaics"
        );

        let canvas = self.assemble(layout, tiles)?;

        info!(path = %path.display(), "Saving canvas");
        if let Err(e) = canvas.save(path) {
            remove_partial(path);
            return Err(e.into());
        }
        Ok(layout.tile_count())
    }
}
