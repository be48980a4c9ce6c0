//! Pixel buffer helpers.
//!
//! Every cell of the mosaic is emitted as an [`RgbImage`] of exactly
//! `tile_edge × tile_edge` pixels. Cells without usable content get a solid
//! white filler so that missing and "no data" tiles look the same in the
//! output and compress to almost nothing.

use image::{DynamicImage, Rgb, RgbImage, RgbaImage};

/// Pixel buffer for one grid cell: `tile_edge × tile_edge`, RGB, 8-bit.
pub type PixelBuffer = RgbImage;

/// Filler colour used for every absent cell.
pub const FILLER: Rgb<u8> = Rgb([255, 255, 255]);

/// Create a white filler tile.
///
/// # Example
///
/// ```
/// use tilestitch::tile::{blank_tile, FILLER};
///
/// let tile = blank_tile(16);
/// assert_eq!(tile.dimensions(), (16, 16));
/// assert!(tile.pixels().all(|p| *p == FILLER));
/// ```
pub fn blank_tile(tile_edge: u32) -> PixelBuffer {
    RgbImage::from_pixel(tile_edge, tile_edge, FILLER)
}

/// Convert a decoded image to 8-bit RGB.
///
/// Images carrying an alpha channel are flattened onto opaque white first;
/// everything else goes through the plain `to_rgb8` conversion.
pub fn to_opaque_rgb(image: DynamicImage) -> PixelBuffer {
    if image.color().has_alpha() {
        flatten_onto_white(&image.to_rgba8())
    } else {
        image.to_rgb8()
    }
}

/// Composite an RGBA image over a white background using alpha as the mask.
///
/// Fully transparent pixels become white, fully opaque pixels keep their
/// colour, partial alpha blends towards white.
pub fn flatten_onto_white(image: &RgbaImage) -> PixelBuffer {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        Rgb([blend(r, a), blend(g, a), blend(b, a)])
    })
}

fn blend(channel: u8, alpha: u8) -> u8 {
    let c = u32::from(channel);
    let a = u32::from(alpha);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Check whether every pixel equals the first one.
///
/// Empty buffers count as uniform.
pub fn is_uniform(buffer: &PixelBuffer) -> bool {
    let raw = buffer.as_raw();
    match raw.get(..3) {
        Some(first) => raw.chunks_exact(3).all(|px| px == first),
        None => true,
    }
}
