//! Streaming tiled BigTIFF writer.
//!
//! Each incoming tile is compressed and appended to the file as soon as it
//! arrives; only the per-tile offsets and byte counts stay in memory. The
//! image directory is written once all tiles are in.
//!
//! ```text
//! header │ tile 0 │ tile 1 │ ... │ tile N-1 │ IFD + TileOffsets + TileByteCounts
//! ```
//!
//! BigTIFF is always used so that mosaics past 4 GiB of compressed data need
//! no special handling.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::str::FromStr;

use flate2::write::ZlibEncoder;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::{debug, info, warn};

use super::writer::{ensure_exhausted, next_tile, remove_partial};
use super::{MosaicLayout, MosaicWriter, WriteError};

/// Default zlib level for deflate-compressed tiles.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Highest accepted zlib level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// TIFF tag values.
const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_DEFLATE: u16 = 8;
const PHOTOMETRIC_RGB: u16 = 2;
const PLANAR_CHUNKY: u16 = 1;
const SAMPLE_FORMAT_UINT: u16 = 1;

/// Tile edges that are not a multiple of this violate the TIFF 6.0 tiling
/// rules; many readers still accept them.
const TILE_EDGE_MULTIPLE: u32 = 16;

/// Upper bound on the offset/byte-count slots reserved before writing.
const MAX_RESERVED_TILES: usize = 1 << 16;

/// Compression method name as used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    #[default]
    Deflate,
    None,
}

impl CompressionMethod {
    /// Configuration name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMethod::Deflate => "deflate",
            CompressionMethod::None => "none",
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deflate" | "zlib" => Ok(CompressionMethod::Deflate),
            "none" => Ok(CompressionMethod::None),
            other => Err(format!("unknown compression '{}', expected deflate or none", other)),
        }
    }
}

/// Per-tile compression applied by [`TiledTiffWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffCompression {
    /// Adobe deflate (zlib stream) at the given level, 0-9.
    Deflate { level: u32 },
    /// Raw tile bytes.
    None,
}

impl TiffCompression {
    /// Combine a method with a level; the level is ignored for `None`.
    pub fn from_method(method: CompressionMethod, level: u32) -> Self {
        match method {
            CompressionMethod::Deflate => TiffCompression::Deflate {
                level: level.min(MAX_COMPRESSION_LEVEL),
            },
            CompressionMethod::None => TiffCompression::None,
        }
    }

    fn tag_value(&self) -> u16 {
        match self {
            TiffCompression::Deflate { .. } => COMPRESSION_DEFLATE,
            TiffCompression::None => COMPRESSION_NONE,
        }
    }

    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>, WriteError> {
        match *self {
            TiffCompression::Deflate { level } => {
                let mut encoder =
                    ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), flate2::Compression::new(level));
                encoder.write_all(raw)?;
                Ok(encoder.finish()?)
            }
            TiffCompression::None => Ok(raw.to_vec()),
        }
    }
}

impl Default for TiffCompression {
    fn default() -> Self {
        TiffCompression::Deflate {
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Writes the mosaic as a tiled, compressed BigTIFF without ever holding the
/// full image in memory.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tilestitch::output::{MosaicLayout, MosaicWriter, TiffCompression, TiledTiffWriter};
/// use tilestitch::tile::blank_tile;
///
/// let layout = MosaicLayout::new(256, 2, 3)?;
/// let writer = TiledTiffWriter::new().with_compression(TiffCompression::Deflate { level: 9 });
/// let mut tiles = (0..6).map(|_| blank_tile(256));
/// writer.write(Path::new("mosaic.tif"), &layout, &mut tiles)?;
/// # Ok::<(), tilestitch::output::WriteError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TiledTiffWriter {
    compression: TiffCompression,
}

impl TiledTiffWriter {
    /// Create a writer using deflate at the default level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-tile compression.
    pub fn with_compression(mut self, compression: TiffCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Current compression setting.
    pub fn compression(&self) -> TiffCompression {
        self.compression
    }

    fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        layout: &MosaicLayout,
        tiles: &mut dyn Iterator<Item = crate::tile::PixelBuffer>,
    ) -> Result<u64, WriteError> {
        let mut encoder = TiffEncoder::new_big(writer)?;
        let mut dir = encoder.image_directory()?;

        let expected = layout.tile_count();
        let capacity = index_capacity(expected);
        let mut offsets: Vec<u64> = Vec::with_capacity(capacity);
        let mut byte_counts: Vec<u64> = Vec::with_capacity(capacity);

        for index in 0..expected {
            let tile = next_tile(tiles, index, layout)?;
            let data = self.compression.encode(tile.as_raw())?;
            offsets.push(dir.write_data(data.as_slice())?);
            byte_counts.push(data.len() as u64);
        }
        ensure_exhausted(tiles, layout)?;

        let channels = usize::from(layout.channels());
        dir.write_tag(Tag::ImageWidth, layout.width())?;
        dir.write_tag(Tag::ImageLength, layout.height())?;
        dir.write_tag(Tag::BitsPerSample, vec![8u16; channels].as_slice())?;
        dir.write_tag(Tag::SamplesPerPixel, layout.channels())?;
        dir.write_tag(Tag::SampleFormat, vec![SAMPLE_FORMAT_UINT; channels].as_slice())?;
        dir.write_tag(Tag::Compression, self.compression.tag_value())?;
        dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_RGB)?;
        dir.write_tag(Tag::PlanarConfiguration, PLANAR_CHUNKY)?;
        dir.write_tag(Tag::TileWidth, layout.tile_edge())?;
        dir.write_tag(Tag::TileLength, layout.tile_edge())?;
        dir.write_tag(Tag::TileOffsets, offsets.as_slice())?;
        dir.write_tag(Tag::TileByteCounts, byte_counts.as_slice())?;
        dir.finish()?;

        let compressed: u64 = byte_counts.iter().sum();
        debug!(tiles = expected, compressed_bytes = compressed, "Tile data written");

        Ok(expected)
    }
}

/// Slots to reserve up front; the index vectors grow past this as needed.
fn index_capacity(tile_count: u64) -> usize {
    usize::try_from(tile_count).map_or(MAX_RESERVED_TILES, |n| n.min(MAX_RESERVED_TILES))
}

impl MosaicWriter for TiledTiffWriter {
    fn name(&self) -> &str {
        "tiled-tiff"
    }

    fn write(
        &self,
        path: &Path,
        layout: &MosaicLayout,
        tiles: &mut dyn Iterator<Item = crate::tile::PixelBuffer>,
    ) -> Result<u64, WriteError> {
        if layout.tile_edge() % TILE_EDGE_MULTIPLE != 0 {
            warn!(
                tile_edge = layout.tile_edge(),
                "Tile edge is not a multiple of {}, some TIFF readers may reject the output",
                TILE_EDGE_MULTIPLE
            );
        }

        info!(
            path = %path.display(),
            width = layout.width(),
            height = layout.height(),
            tile_edge = layout.tile_edge(),
            tiles = layout.tile_count(),
            compression = ?self.compression,
            "Writing tiled BigTIFF"
        );

        let result = File::create(path).map_err(WriteError::from).and_then(|file| {
            let mut writer = BufWriter::new(file);
            let written = self.write_to(&mut writer, layout, tiles)?;
            writer.flush()?;
            Ok(written)
        });

        if result.is_err() {
            remove_partial(path);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{blank_tile, PixelBuffer};
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;
    use tiff::decoder::{Decoder, DecodingResult};

    fn gradient_tile(edge: u32, seed: u8) -> PixelBuffer {
        RgbImage::from_fn(edge, edge, |x, y| Rgb([x as u8, y as u8, seed]))
    }

    fn read_back(path: &Path) -> (u32, u32, Vec<u8>) {
        let file = File::open(path).unwrap();
        let mut decoder = Decoder::new(file).unwrap();
        let (width, height) = decoder.dimensions().unwrap();
        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => (width, height, data),
            _ => panic!("expected 8-bit samples"),
        }
    }

    #[test]
    fn test_compression_method_parse() {
        assert_eq!("deflate".parse(), Ok(CompressionMethod::Deflate));
        assert_eq!("ZLIB".parse(), Ok(CompressionMethod::Deflate));
        assert_eq!(" none ".parse(), Ok(CompressionMethod::None));
        assert!("lzw".parse::<CompressionMethod>().is_err());
    }

    #[test]
    fn test_from_method_clamps_level() {
        assert_eq!(
            TiffCompression::from_method(CompressionMethod::Deflate, 42),
            TiffCompression::Deflate { level: 9 }
        );
        assert_eq!(
            TiffCompression::from_method(CompressionMethod::None, 3),
            TiffCompression::None
        );
    }

    #[test]
    fn test_write_and_read_back_deflate() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.tif");
        let layout = MosaicLayout::new(16, 2, 2).unwrap();
        let source: Vec<_> = (0..4).map(|i| gradient_tile(16, i as u8 * 50)).collect();

        let written = TiledTiffWriter::new()
            .write(&path, &layout, &mut source.clone().into_iter())
            .unwrap();
        assert_eq!(written, 4);

        let (width, height, data) = read_back(&path);
        assert_eq!((width, height), (32, 32));

        // Pixel (x=20, y=3) lies in tile 1 at (4, 3).
        let offset = ((3 * 32 + 20) * 3) as usize;
        assert_eq!(&data[offset..offset + 3], &source[1].get_pixel(4, 3).0);
        // Pixel (x=5, y=17) lies in tile 2 at (5, 1).
        let offset = ((17 * 32 + 5) * 3) as usize;
        assert_eq!(&data[offset..offset + 3], &source[2].get_pixel(5, 1).0);
    }

    #[test]
    fn test_write_uncompressed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("raw.tiff");
        let layout = MosaicLayout::new(16, 1, 3).unwrap();
        let mut tiles = (0..3).map(|_| blank_tile(16));

        TiledTiffWriter::new()
            .with_compression(TiffCompression::None)
            .write(&path, &layout, &mut tiles)
            .unwrap();

        let (width, height, data) = read_back(&path);
        assert_eq!((width, height), (48, 16));
        assert!(data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_deflate_output_is_smaller_for_blank_tiles() {
        let temp = TempDir::new().unwrap();
        let layout = MosaicLayout::new(64, 2, 2).unwrap();

        let deflate = temp.path().join("deflate.tif");
        TiledTiffWriter::new()
            .write(&deflate, &layout, &mut (0..4).map(|_| blank_tile(64)))
            .unwrap();

        let raw = temp.path().join("raw.tif");
        TiledTiffWriter::new()
            .with_compression(TiffCompression::None)
            .write(&raw, &layout, &mut (0..4).map(|_| blank_tile(64)))
            .unwrap();

        let deflate_len = std::fs::metadata(&deflate).unwrap().len();
        let raw_len = std::fs::metadata(&raw).unwrap().len();
        assert!(deflate_len < raw_len / 10, "{} vs {}", deflate_len, raw_len);
    }

    #[test]
    fn test_short_sequence_removes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("short.tif");
        let layout = MosaicLayout::new(16, 2, 2).unwrap();
        let mut tiles = (0..3).map(|_| blank_tile(16));

        let err = TiledTiffWriter::new().write(&path, &layout, &mut tiles).unwrap_err();
        assert!(matches!(
            err,
            WriteError::TileCountMismatch {
                expected: 4,
                actual: 3
            }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_long_sequence_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("long.tif");
        let layout = MosaicLayout::new(16, 1, 1).unwrap();
        let mut tiles = (0..2).map(|_| blank_tile(16));

        let err = TiledTiffWriter::new().write(&path, &layout, &mut tiles).unwrap_err();
        assert!(matches!(err, WriteError::TileCountMismatch { expected: 1, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_wrong_tile_shape_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shape.tif");
        let layout = MosaicLayout::new(16, 1, 2).unwrap();
        let mut tiles = vec![blank_tile(16), blank_tile(32)].into_iter();

        let err = TiledTiffWriter::new().write(&path, &layout, &mut tiles).unwrap_err();
        assert!(matches!(err, WriteError::TileShapeMismatch { index: 1, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_tile_edge_not_multiple_of_16() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("edge100.tif");
        let layout = MosaicLayout::new(100, 2, 2).unwrap();
        let source = vec![
            gradient_tile(100, 10),
            gradient_tile(100, 90),
            blank_tile(100),
            gradient_tile(100, 170),
        ];

        let written = TiledTiffWriter::new()
            .write(&path, &layout, &mut source.clone().into_iter())
            .unwrap();
        assert_eq!(written, 4);

        let (width, height, data) = read_back(&path);
        assert_eq!((width, height), (200, 200));

        let image = RgbImage::from_raw(width, height, data).unwrap();
        for (index, tile) in source.iter().enumerate() {
            let (ox, oy) = layout.tile_origin(index as u64).unwrap();
            for (x, y) in [(0, 0), (99, 0), (37, 64), (99, 99)] {
                assert_eq!(
                    image.get_pixel(ox + x, oy + y),
                    tile.get_pixel(x, y),
                    "tile {} pixel ({}, {})",
                    index,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_index_capacity_is_bounded() {
        assert_eq!(index_capacity(0), 0);
        assert_eq!(index_capacity(12), 12);
        assert_eq!(index_capacity(u64::from(u32::MAX)), MAX_RESERVED_TILES);
        assert_eq!(index_capacity(u64::MAX), MAX_RESERVED_TILES);
    }

    #[test]
    fn test_huge_sparse_layout_fails_cleanly() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sparse.tif");
        // 3.6 billion one-pixel tiles; only the declared count is huge.
        let layout = MosaicLayout::new(1, 60_000, 60_000).unwrap();
        let mut tiles = (0..5).map(|_| blank_tile(1));

        let err = TiledTiffWriter::new().write(&path, &layout, &mut tiles).unwrap_err();
        assert!(matches!(
            err,
            WriteError::TileCountMismatch {
                expected: 3_600_000_000,
                actual: 5
            }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_to_memory() {
        let layout = MosaicLayout::new(16, 1, 1).unwrap();
        let mut cursor = Cursor::new(Vec::new());
        let mut tiles = std::iter::once(gradient_tile(16, 3));

        TiledTiffWriter::new()
            .write_to(&mut cursor, &layout, &mut tiles)
            .unwrap();

        // BigTIFF little-endian magic: "II", 43.
        let bytes = cursor.into_inner();
        assert_eq!(&bytes[..4], &[0x49, 0x49, 0x2B, 0x00]);
    }
}
