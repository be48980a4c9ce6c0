//! Merge facade.
//!
//! [`run_merge`] wires the whole pipeline for one run:
//!
//! ```text
//! MergeConfig
//!     │ validate, pick writer
//!     ▼
//! GridScanner ──▶ Grid ──▶ MosaicLayout
//!     │
//!     ▼
//! TileResolver ──▶ RowMajorStreamer ──▶ MosaicWriter ──▶ output file
//!                          │
//!                          └──▶ progress callback, StreamStats
//! ```
//!
//! Any error before the writer starts leaves the filesystem untouched.
//!
//! # Example
//!
//! ```no_run
//! use tilestitch::app::{run_merge, MergeConfig};
//!
//! let config = MergeConfig::new("tiles", "mosaic.tif");
//! let report = run_merge(&config, |_| {})?;
//! println!("{}", report);
//! # Ok::<(), tilestitch::app::MergeError>(())
//! ```

mod config;
mod error;

pub use config::MergeConfig;
pub use error::MergeError;

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::config::format_size;
use crate::coord::GridBounds;
use crate::grid::GridScanner;
use crate::output::{CanvasWriter, MosaicLayout, MosaicWriter, TiledTiffWriter};
use crate::stream::{RowMajorStreamer, StreamProgress, StreamStats};
use crate::tile::TileResolver;

/// Summary of a finished merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// File that was written.
    pub output: PathBuf,
    /// Name of the writer that produced it.
    pub writer: String,
    /// Grid bounding box.
    pub bounds: GridBounds,
    pub tile_edge: u32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    pub tiles_written: u64,
    /// Per-outcome tallies from the streamer.
    pub stats: StreamStats,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Wrote {} ({}×{} px, {}, {}px tiles, {} writer): {}",
            self.output.display(),
            self.width,
            self.height,
            self.bounds,
            self.tile_edge,
            self.writer,
            self.stats
        )
    }
}

/// Assemble the tile tree at `config.input()` into `config.output()`.
///
/// `progress` is called after every emitted tile.
///
/// # Errors
///
/// - [`MergeError::InvalidConfig`] for unusable settings
/// - [`MergeError::Scan`] if the input cannot be turned into a grid
/// - [`MergeError::Write`] if the output cannot be written; no partial file
///   is left behind
pub fn run_merge<F>(config: &MergeConfig, progress: F) -> Result<MergeReport, MergeError>
where
    F: FnMut(&StreamProgress),
{
    config.validate()?;
    let writer = select_writer(config)?;

    info!(
        input = %config.input().display(),
        output = %config.output().display(),
        writer = writer.name(),
        min_size = %format_size(config.min_tile_bytes()),
        "Starting merge"
    );

    let grid = GridScanner::new(config.input()).scan()?;
    let layout = MosaicLayout::from_grid(&grid)?;
    info!(layout = %layout, "Output layout");

    let resolver = TileResolver::new(&grid).with_min_tile_bytes(config.min_tile_bytes());
    let mut streamer = RowMajorStreamer::new(resolver, grid.bounds()).with_progress(progress);

    let tiles_written = writer.write(config.output(), &layout, &mut streamer)?;
    let stats = streamer.into_stats();

    let report = MergeReport {
        output: config.output().to_path_buf(),
        writer: writer.name().to_string(),
        bounds: grid.bounds(),
        tile_edge: grid.tile_edge(),
        width: layout.width(),
        height: layout.height(),
        tiles_written,
        stats,
    };

    info!(
        output = %report.output.display(),
        tiles = report.tiles_written,
        present = report.stats.present,
        absent = report.stats.absent_total(),
        "Merge complete"
    );

    Ok(report)
}

fn select_writer(config: &MergeConfig) -> Result<Box<dyn MosaicWriter>, MergeError> {
    match config.writer().uses_tiled(config.output()) {
        Some(true) => Ok(Box::new(
            TiledTiffWriter::new().with_compression(config.tiff_compression()),
        )),
        Some(false) => Ok(Box::new(CanvasWriter::new())),
        None => Err(MergeError::InvalidConfig(format!(
            "writer '{}' cannot produce {}",
            config.writer(),
            config.output().display()
        ))),
    }
}
