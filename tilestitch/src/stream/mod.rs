//! Row-major tile streaming.
//!
//! [`RowMajorStreamer`] walks every cell of the grid bounding box, rows
//! ascending then columns ascending, and yields one [`PixelBuffer`] per cell.
//! Absent cells become white filler, so the sequence length always equals
//! the cell count no matter how sparse the input is.
//!
//! The sequence is lazy: each buffer is resolved only when the consumer asks
//! for it, and nothing is kept once it has been handed out.

mod stats;

pub use stats::{StreamProgress, StreamStats};

use tracing::info;

use crate::coord::{GridBounds, GridCoord};
use crate::tile::{PixelBuffer, ResolutionOutcome, TileSource};

type ProgressFn<'a> = Box<dyn FnMut(&StreamProgress) + 'a>;

/// Lazy, exactly-sized iterator over every cell of a grid.
///
/// # Example
///
/// ```no_run
/// use tilestitch::grid::scan;
/// use tilestitch::stream::RowMajorStreamer;
/// use tilestitch::tile::TileResolver;
///
/// let grid = scan("tiles".as_ref())?;
/// let mut streamer = RowMajorStreamer::new(TileResolver::new(&grid), grid.bounds());
/// assert_eq!(streamer.len() as u64, grid.cell_count());
/// for tile in streamer.by_ref() {
///     assert_eq!(tile.width(), grid.tile_edge());
/// }
/// println!("{} present", streamer.stats().present);
/// # Ok::<(), tilestitch::grid::ScanError>(())
/// ```
pub struct RowMajorStreamer<'a, S: TileSource> {
    source: S,
    bounds: GridBounds,
    coords: Box<dyn Iterator<Item = GridCoord> + 'a>,
    total: u64,
    stats: StreamStats,
    progress: Option<ProgressFn<'a>>,
}

impl<'a, S: TileSource> RowMajorStreamer<'a, S> {
    /// Create a streamer over `bounds`, resolving cells through `source`.
    pub fn new(source: S, bounds: GridBounds) -> Self {
        Self {
            source,
            bounds,
            coords: Box::new(bounds.coords()),
            total: bounds.cell_count(),
            stats: StreamStats::default(),
            progress: None,
        }
    }

    /// Register a callback invoked after every emitted cell.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&StreamProgress) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Bounds being streamed.
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Total number of cells the sequence yields.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Outcome tallies so far.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Consume the streamer and return its final tallies.
    pub fn into_stats(self) -> StreamStats {
        self.stats
    }

    fn report(&mut self, coord: GridCoord) {
        let progress = StreamProgress {
            emitted: self.stats.emitted,
            total: self.total,
            row: coord.row,
        };

        if coord.col == self.bounds.cols().max() {
            info!(
                row = coord.row,
                emitted = progress.emitted,
                total = progress.total,
                "Row streamed"
            );
        }

        if let Some(callback) = self.progress.as_mut() {
            callback(&progress);
        }
    }
}

impl<S: TileSource> Iterator for RowMajorStreamer<'_, S> {
    type Item = PixelBuffer;

    fn next(&mut self) -> Option<Self::Item> {
        let coord = self.coords.next()?;
        let outcome = self.source.resolve(coord);
        self.stats.record(&outcome);

        let buffer = match outcome {
            ResolutionOutcome::Present(buffer) => buffer,
            absent => absent.into_buffer(self.source.tile_edge()),
        };

        self.report(coord);
        Some(buffer)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total.saturating_sub(self.stats.emitted);
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl<S: TileSource> ExactSizeIterator for RowMajorStreamer<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::IndexRange;
    use crate::tile::{AbsentReason, FILLER};
    use image::{Rgb, RgbImage};
    use std::collections::HashSet;

    /// Mock source: cells listed in `present` get a tile whose first pixel
    /// encodes the coordinate, everything else is absent.
    struct MockSource {
        edge: u32,
        present: HashSet<GridCoord>,
        missing_rows: HashSet<u32>,
        visited: Vec<GridCoord>,
    }

    impl MockSource {
        fn new(edge: u32) -> Self {
            Self {
                edge,
                present: HashSet::new(),
                missing_rows: HashSet::new(),
                visited: Vec::new(),
            }
        }

        fn marker(coord: GridCoord) -> Rgb<u8> {
            Rgb([coord.row as u8, coord.col as u8, 1])
        }
    }

    impl TileSource for MockSource {
        fn tile_edge(&self) -> u32 {
            self.edge
        }

        fn resolve(&mut self, coord: GridCoord) -> ResolutionOutcome {
            self.visited.push(coord);
            if self.missing_rows.contains(&coord.row) {
                return ResolutionOutcome::Absent(AbsentReason::NoRow);
            }
            if self.present.contains(&coord) {
                let mut tile = RgbImage::from_pixel(self.edge, self.edge, Rgb([0, 0, 0]));
                tile.put_pixel(0, 0, Self::marker(coord));
                ResolutionOutcome::Present(tile)
            } else {
                ResolutionOutcome::Absent(AbsentReason::NoFile)
            }
        }
    }

    fn bounds(r0: u32, r1: u32, c0: u32, c1: u32) -> GridBounds {
        GridBounds::new(IndexRange::new(r0, r1).unwrap(), IndexRange::new(c0, c1).unwrap())
    }

    #[test]
    fn test_yields_every_cell_in_row_major_order() {
        let mut source = MockSource::new(4);
        let grid = bounds(3, 4, 7, 9);

        let count = RowMajorStreamer::new(&mut source, grid).count();
        assert_eq!(count, 6);
        let expected: Vec<_> = grid.coords().collect();
        assert_eq!(source.visited, expected);
    }

    #[test]
    fn test_absent_cells_are_white() {
        let mut source = MockSource::new(4);
        source.present.insert(GridCoord::new(0, 0));
        source.present.insert(GridCoord::new(1, 1));

        let tiles: Vec<_> = RowMajorStreamer::new(&mut source, bounds(0, 1, 0, 1)).collect();
        assert_eq!(tiles.len(), 4);
        assert_eq!(*tiles[0].get_pixel(0, 0), MockSource::marker(GridCoord::new(0, 0)));
        assert!(tiles[1].pixels().all(|p| *p == FILLER));
        assert!(tiles[2].pixels().all(|p| *p == FILLER));
        assert_eq!(*tiles[3].get_pixel(0, 0), MockSource::marker(GridCoord::new(1, 1)));
    }

    #[test]
    fn test_missing_row_does_not_shift_neighbours() {
        let mut source = MockSource::new(2);
        source.missing_rows.insert(1);
        for coord in bounds(0, 2, 0, 1).coords() {
            source.present.insert(coord);
        }

        let tiles: Vec<_> = RowMajorStreamer::new(&mut source, bounds(0, 2, 0, 1)).collect();
        assert_eq!(*tiles[1].get_pixel(0, 0), MockSource::marker(GridCoord::new(0, 1)));
        assert!(tiles[2].pixels().all(|p| *p == FILLER));
        assert!(tiles[3].pixels().all(|p| *p == FILLER));
        assert_eq!(*tiles[4].get_pixel(0, 0), MockSource::marker(GridCoord::new(2, 0)));
    }

    #[test]
    fn test_stats_tally_outcomes() {
        let mut source = MockSource::new(2);
        source.missing_rows.insert(0);
        source.present.insert(GridCoord::new(1, 0));

        let mut streamer = RowMajorStreamer::new(&mut source, bounds(0, 1, 0, 1));
        streamer.by_ref().for_each(drop);
        let stats = streamer.into_stats();

        assert_eq!(stats.emitted, 4);
        assert_eq!(stats.present, 1);
        assert_eq!(stats.absent(AbsentReason::NoRow), 2);
        assert_eq!(stats.absent(AbsentReason::NoFile), 1);
        assert_eq!(stats.absent_total(), 3);
    }

    #[test]
    fn test_exact_size_decreases() {
        let mut source = MockSource::new(2);
        let mut streamer = RowMajorStreamer::new(&mut source, bounds(0, 0, 0, 2));
        assert_eq!(streamer.len(), 3);
        streamer.next();
        assert_eq!(streamer.len(), 2);
        streamer.next();
        streamer.next();
        assert_eq!(streamer.len(), 0);
        assert!(streamer.next().is_none());
    }

    #[test]
    fn test_progress_callback_sees_every_cell() {
        let mut source = MockSource::new(2);
        let mut seen = Vec::new();

        let streamer = RowMajorStreamer::new(&mut source, bounds(5, 6, 0, 1))
            .with_progress(|p: &StreamProgress| seen.push((p.emitted, p.total, p.row)));
        streamer.for_each(drop);

        assert_eq!(seen, vec![(1, 4, 5), (2, 4, 5), (3, 4, 6), (4, 4, 6)]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn emits_exactly_cell_count(
                r0 in 0u32..50,
                rows in 1u32..6,
                c0 in 0u32..50,
                cols in 1u32..6,
                edge in 1u32..5,
            ) {
                let grid = bounds(r0, r0 + rows - 1, c0, c0 + cols - 1);
                let mut source = MockSource::new(edge);
                let tiles: Vec<_> = RowMajorStreamer::new(&mut source, grid).collect();

                prop_assert_eq!(tiles.len() as u64, grid.cell_count());
                for tile in &tiles {
                    prop_assert_eq!(tile.dimensions(), (edge, edge));
                }
            }

            #[test]
            fn visits_rows_then_columns_ascending(
                r0 in 0u32..20,
                rows in 1u32..5,
                c0 in 0u32..20,
                cols in 1u32..5,
            ) {
                let grid = bounds(r0, r0 + rows - 1, c0, c0 + cols - 1);
                let mut source = MockSource::new(1);
                RowMajorStreamer::new(&mut source, grid).for_each(drop);

                let mut sorted = source.visited.clone();
                sorted.sort_by_key(|c| (c.row, c.col));
                prop_assert_eq!(&source.visited, &sorted);
                prop_assert_eq!(source.visited.len() as u64, grid.cell_count());
            }
        }
    }
}
