//! TileSource trait for abstracting where cell content comes from.
//!
//! The row-major streamer only needs two things from its tile provider: the
//! tile edge length and a resolution for each coordinate. Keeping that behind
//! a trait lets the streamer be exercised without touching the filesystem.
//!
//! # Example
//!
//! ```
//! use tilestitch::coord::GridCoord;
//! use tilestitch::tile::{AbsentReason, ResolutionOutcome, TileSource};
//!
//! struct Nothing;
//!
//! impl TileSource for Nothing {
//!     fn tile_edge(&self) -> u32 {
//!         16
//!     }
//!
//!     fn resolve(&mut self, _coord: GridCoord) -> ResolutionOutcome {
//!         ResolutionOutcome::Absent(AbsentReason::NoFile)
//!     }
//! }
//!
//! let mut source = Nothing;
//! assert!(!source.resolve(GridCoord::new(0, 0)).is_present());
//! ```

use crate::coord::GridCoord;
use crate::tile::ResolutionOutcome;

/// Trait for per-cell tile providers.
///
/// `resolve` takes `&mut self` so implementations can cache per-row state
/// between calls. Implementations must never fail: every problem is folded
/// into [`ResolutionOutcome::Absent`].
///
/// # Implementors
///
/// - [`TileResolver`](crate::tile::TileResolver) - Reads tiles from a scanned directory grid
pub trait TileSource {
    /// Edge length in pixels of every tile this source produces.
    fn tile_edge(&self) -> u32;

    /// Resolve one grid cell.
    ///
    /// A `Present` buffer must be exactly `tile_edge × tile_edge` RGB.
    fn resolve(&mut self, coord: GridCoord) -> ResolutionOutcome;
}

impl<S: TileSource + ?Sized> TileSource for &mut S {
    fn tile_edge(&self) -> u32 {
        (**self).tile_edge()
    }

    fn resolve(&mut self, coord: GridCoord) -> ResolutionOutcome {
        (**self).resolve(coord)
    }
}
