//! Per-cell resolution outcomes.

use std::fmt;

use super::pixels::{blank_tile, PixelBuffer};

/// Why a grid cell produced no pixel data.
///
/// The streamer fills every absent cell with the same white tile; the reason
/// only feeds logging and the end-of-run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsentReason {
    /// No row directory exists for this row index.
    NoRow,
    /// The row exists but holds no file for this column.
    NoFile,
    /// The file is smaller than the configured minimum and was not opened.
    Undersized,
    /// The file could not be decoded, or its size does not match the grid.
    DecodeError,
    /// The tile decoded fine but every pixel has the same value.
    UniformBlank,
}

impl AbsentReason {
    /// All reasons, in pipeline order.
    pub const ALL: [AbsentReason; 5] = [
        AbsentReason::NoRow,
        AbsentReason::NoFile,
        AbsentReason::Undersized,
        AbsentReason::DecodeError,
        AbsentReason::UniformBlank,
    ];

    /// Short identifier used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsentReason::NoRow => "no-row",
            AbsentReason::NoFile => "no-file",
            AbsentReason::Undersized => "undersized",
            AbsentReason::DecodeError => "decode-error",
            AbsentReason::UniformBlank => "uniform-blank",
        }
    }
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// Real tile content, already converted to opaque RGB.
    Present(PixelBuffer),
    /// No usable content.
    Absent(AbsentReason),
}

impl ResolutionOutcome {
    /// Whether the cell carries real content.
    pub fn is_present(&self) -> bool {
        matches!(self, ResolutionOutcome::Present(_))
    }

    /// The absence reason, if any.
    pub fn absent_reason(&self) -> Option<AbsentReason> {
        match self {
            ResolutionOutcome::Present(_) => None,
            ResolutionOutcome::Absent(reason) => Some(*reason),
        }
    }

    /// Take the pixel buffer, substituting a white tile for absent cells.
    pub fn into_buffer(self, tile_edge: u32) -> PixelBuffer {
        match self {
            ResolutionOutcome::Present(buffer) => buffer,
            ResolutionOutcome::Absent(_) => blank_tile(tile_edge),
        }
    }
}
