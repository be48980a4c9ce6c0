//! Per-cell tile resolution.
//!
//! Every grid cell resolves to either real RGB content or an
//! [`AbsentReason`]. Absent cells are emitted as white filler.

mod outcome;
mod pixels;
mod resolver;
mod source;

pub use outcome::{AbsentReason, ResolutionOutcome};
pub use pixels::{blank_tile, flatten_onto_white, is_uniform, to_opaque_rgb, PixelBuffer, FILLER};
pub use resolver::{TileResolver, DEFAULT_MIN_TILE_BYTES};
pub use source::TileSource;
