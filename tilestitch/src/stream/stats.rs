//! Outcome tallies and progress snapshots.

use std::fmt;

use crate::tile::{AbsentReason, ResolutionOutcome};

/// Counts of what the streamer emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Cells emitted so far.
    pub emitted: u64,
    /// Cells that carried real tile content.
    pub present: u64,
    absent: [u64; AbsentReason::ALL.len()],
}

impl StreamStats {
    /// Record one resolution outcome.
    pub fn record(&mut self, outcome: &ResolutionOutcome) {
        self.emitted += 1;
        match outcome.absent_reason() {
            None => self.present += 1,
            Some(reason) => self.absent[slot(reason)] += 1,
        }
    }

    /// Number of cells that were absent for the given reason.
    pub fn absent(&self, reason: AbsentReason) -> u64 {
        self.absent[slot(reason)]
    }

    /// Number of absent cells across all reasons.
    pub fn absent_total(&self) -> u64 {
        self.absent.iter().sum()
    }

    /// Non-zero absence counts, in pipeline order.
    pub fn absent_breakdown(&self) -> impl Iterator<Item = (AbsentReason, u64)> + '_ {
        AbsentReason::ALL
            .iter()
            .map(|&reason| (reason, self.absent(reason)))
            .filter(|&(_, count)| count > 0)
    }
}

impl fmt::Display for StreamStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tiles, {} present", self.emitted, self.present)?;
        for (reason, count) in self.absent_breakdown() {
            write!(f, ", {} {}", count, reason)?;
        }
        Ok(())
    }
}

fn slot(reason: AbsentReason) -> usize {
    match reason {
        AbsentReason::NoRow => 0,
        AbsentReason::NoFile => 1,
        AbsentReason::Undersized => 2,
        AbsentReason::DecodeError => 3,
        AbsentReason::UniformBlank => 4,
    }
}

/// Progress snapshot passed to the streamer's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamProgress {
    /// Cells emitted including the current one.
    pub emitted: u64,
    /// Total cells in the grid.
    pub total: u64,
    /// Row of the cell just emitted.
    pub row: u32,
}
