//! Filesystem-backed tile resolution.
//!
//! The resolver runs the per-cell pipeline:
//!
//! ```text
//! row dir? ──no──▶ NoRow
//!    │
//! column file? ──no──▶ NoFile
//!    │
//! size ≥ min? ──no──▶ Undersized
//!    │
//! header is tile_edge², decodes? ──no──▶ DecodeError
//!    │
//! flatten alpha, uniform? ──yes──▶ UniformBlank
//!    │
//! Present(rgb)
//! ```
//!
//! Column listings are cached for exactly one row. Cells are visited in
//! row-major order, so each row directory is listed once per run.

use std::path::Path;

use image::{DynamicImage, ImageError, ImageReader};
use tracing::{debug, warn};

use super::{is_uniform, to_opaque_rgb, AbsentReason, ResolutionOutcome, TileSource};
use crate::coord::GridCoord;
use crate::grid::Grid;
use crate::locator::{list_columns, ColumnMap};

/// Files smaller than this many bytes are treated as "no data" placeholders.
pub const DEFAULT_MIN_TILE_BYTES: u64 = 100;

/// Resolves grid cells against the files discovered by a scan.
#[derive(Debug)]
pub struct TileResolver<'g> {
    grid: &'g Grid,
    min_tile_bytes: u64,
    /// Column listing of the most recently visited row; `None` inside means
    /// the row has no directory.
    cached_row: Option<(u32, Option<ColumnMap>)>,
}

impl<'g> TileResolver<'g> {
    /// Create a resolver using [`DEFAULT_MIN_TILE_BYTES`].
    pub fn new(grid: &'g Grid) -> Self {
        Self {
            grid,
            min_tile_bytes: DEFAULT_MIN_TILE_BYTES,
            cached_row: None,
        }
    }

    /// Set the minimum file size below which a tile is skipped unread.
    pub fn with_min_tile_bytes(mut self, bytes: u64) -> Self {
        self.min_tile_bytes = bytes;
        self
    }

    /// Current minimum tile size in bytes.
    pub fn min_tile_bytes(&self) -> u64 {
        self.min_tile_bytes
    }

    fn columns_for(&mut self, row: u32) -> Option<&ColumnMap> {
        let cached = matches!(self.cached_row, Some((r, _)) if r == row);
        if !cached {
            let columns = match self.grid.row_dir(row) {
                Some(dir) => Some(list_columns(dir)),
                None => {
                    warn!(row, "Row directory missing, filling row with blank tiles");
                    None
                }
            };
            self.cached_row = Some((row, columns));
        }
        self.cached_row.as_ref().and_then(|(_, columns)| columns.as_ref())
    }
}

impl TileSource for TileResolver<'_> {
    fn tile_edge(&self) -> u32 {
        self.grid.tile_edge()
    }

    fn resolve(&mut self, coord: GridCoord) -> ResolutionOutcome {
        let tile_edge = self.grid.tile_edge();
        let min_tile_bytes = self.min_tile_bytes;

        let Some(columns) = self.columns_for(coord.row) else {
            return ResolutionOutcome::Absent(AbsentReason::NoRow);
        };

        let Some(tile) = columns.get(&coord.col) else {
            warn!(row = coord.row, col = coord.col, "Tile file missing, using blank tile");
            return ResolutionOutcome::Absent(AbsentReason::NoFile);
        };

        if tile.size() < min_tile_bytes {
            warn!(
                path = %tile.path().display(),
                size = tile.size(),
                min_size = min_tile_bytes,
                "Tile below minimum size, treating as empty"
            );
            return ResolutionOutcome::Absent(AbsentReason::Undersized);
        }

        // Size is checked from the header; only tile_edge² images are decoded.
        let (width, height) = match header_dimensions(tile.path()) {
            Ok(dimensions) => dimensions,
            Err(e) => {
                warn!(path = %tile.path().display(), error = %e, "Failed to read tile header");
                return ResolutionOutcome::Absent(AbsentReason::DecodeError);
            }
        };

        if width != tile_edge || height != tile_edge {
            warn!(
                path = %tile.path().display(),
                width,
                height,
                tile_edge,
                "Tile size does not match grid, using blank tile"
            );
            return ResolutionOutcome::Absent(AbsentReason::DecodeError);
        }

        let image = match load_tile(tile.path()) {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %tile.path().display(), error = %e, "Failed to decode tile");
                return ResolutionOutcome::Absent(AbsentReason::DecodeError);
            }
        };

        let rgb = to_opaque_rgb(image);
        if is_uniform(&rgb) {
            debug!(path = %tile.path().display(), "Uniform tile, treating as empty");
            return ResolutionOutcome::Absent(AbsentReason::UniformBlank);
        }

        ResolutionOutcome::Present(rgb)
    }
}

fn header_dimensions(path: &Path) -> Result<(u32, u32), ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.into_dimensions()
}

fn load_tile(path: &Path) -> Result<DynamicImage, ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::scan;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    const EDGE: u32 = 16;

    fn noisy_tile(seed: u8) -> RgbImage {
        RgbImage::from_fn(EDGE, EDGE, |x, y| {
            let v = ((x * 31 + y * 17) ^ (x * y)) as u8;
            Rgb([v.wrapping_add(seed), v.wrapping_mul(3), seed])
        })
    }

    fn write_png(root: &Path, row: u32, col: u32, image: &RgbImage) {
        let dir = root.join(row.to_string());
        fs::create_dir_all(&dir).unwrap();
        image.save(dir.join(format!("{col}.png"))).unwrap();
    }

    #[test]
    fn test_resolves_present_tile() {
        let temp = TempDir::new().unwrap();
        let tile = noisy_tile(7);
        write_png(temp.path(), 0, 0, &tile);

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid);

        assert_eq!(resolver.tile_edge(), EDGE);
        assert_eq!(resolver.resolve(GridCoord::new(0, 0)), ResolutionOutcome::Present(tile));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        write_png(temp.path(), 1, 1, &noisy_tile(2));

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid);

        let first = resolver.resolve(GridCoord::new(0, 0));
        let _ = resolver.resolve(GridCoord::new(1, 1));
        let again = resolver.resolve(GridCoord::new(0, 0));
        assert_eq!(first, again);
    }

    #[test]
    fn test_missing_row_and_file() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        write_png(temp.path(), 2, 1, &noisy_tile(2));

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid);

        assert_eq!(
            resolver.resolve(GridCoord::new(1, 0)).absent_reason(),
            Some(AbsentReason::NoRow)
        );
        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::NoFile)
        );
    }

    #[test]
    fn test_undersized_file_is_not_opened() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        // Garbage content, but too small to ever be decoded.
        fs::write(temp.path().join("0").join("1.png"), b"tiny").unwrap();

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid);

        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::Undersized)
        );
    }

    #[test]
    fn test_zero_threshold_lets_small_files_through() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        fs::write(temp.path().join("0").join("1.png"), b"tiny").unwrap();

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid).with_min_tile_bytes(0);

        assert_eq!(resolver.min_tile_bytes(), 0);
        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::DecodeError)
        );
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        fs::write(temp.path().join("0").join("1.png"), vec![0xAB; 512]).unwrap();

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid);

        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::DecodeError)
        );
    }

    #[test]
    fn test_size_check_reads_header_only() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        let big = RgbImage::from_fn(EDGE * 4, EDGE * 4, |x, y| {
            Rgb([(x * 7 ^ y * 13) as u8, (x * y) as u8, (x + y) as u8])
        });
        write_png(temp.path(), 0, 1, &big);

        // Cut the file inside its pixel data: the header is intact, the
        // pixels are not.
        let path = temp.path().join("0").join("1.png");
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert_eq!(header_dimensions(&path).unwrap(), (EDGE * 4, EDGE * 4));
        assert!(load_tile(&path).is_err());

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid).with_min_tile_bytes(0);
        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::DecodeError)
        );
    }

    #[test]
    fn test_wrong_dimensions_is_decode_error() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        let big = RgbImage::from_fn(EDGE * 2, EDGE * 2, |x, y| Rgb([x as u8, y as u8, 0]));
        write_png(temp.path(), 0, 1, &big);

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid);

        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::DecodeError)
        );
    }

    #[test]
    fn test_uniform_tile_is_blank() {
        let temp = TempDir::new().unwrap();
        write_png(temp.path(), 0, 0, &noisy_tile(1));
        write_png(temp.path(), 0, 1, &RgbImage::from_pixel(EDGE, EDGE, Rgb([0, 0, 0])));

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid).with_min_tile_bytes(0);

        assert_eq!(
            resolver.resolve(GridCoord::new(0, 1)).absent_reason(),
            Some(AbsentReason::UniformBlank)
        );
    }

    #[test]
    fn test_alpha_tile_is_flattened() {
        let temp = TempDir::new().unwrap();
        let rgba = RgbaImage::from_fn(EDGE, EDGE, |x, _| {
            if x == 0 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([10, 20, 30, 255])
            }
        });
        let dir = temp.path().join("0");
        fs::create_dir_all(&dir).unwrap();
        rgba.save(dir.join("0.png")).unwrap();

        let grid = scan(temp.path()).unwrap();
        let mut resolver = TileResolver::new(&grid).with_min_tile_bytes(0);

        let ResolutionOutcome::Present(rgb) = resolver.resolve(GridCoord::new(0, 0)) else {
            panic!("expected present tile");
        };
        assert_eq!(*rgb.get_pixel(0, 3), Rgb([255, 255, 255]));
        assert_eq!(*rgb.get_pixel(1, 3), Rgb([10, 20, 30]));
    }
}
