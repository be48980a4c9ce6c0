//! Error types for grid scanning.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while scanning the input tree.
///
/// All of these abort the run before any output is written.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input root does not exist or cannot be listed.
    #[error("Input directory unreadable: {}: {source}", .path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No numeric row directories or no numeric tile files were found.
    #[error("Empty grid: {0}")]
    EmptyGrid(String),

    /// The reference tile used to measure the tile edge could not be read.
    #[error("No readable reference tile at {}: {reason}", .path.display())]
    NoReadableTile { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unreadable_display_and_source() {
        let err = ScanError::RootUnreadable {
            path: PathBuf::from("/data/tiles"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "Input directory unreadable: /data/tiles: gone");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_empty_grid_display() {
        let err = ScanError::EmptyGrid("no numeric row directories".to_string());
        assert_eq!(err.to_string(), "Empty grid: no numeric row directories");
    }

    #[test]
    fn test_no_readable_tile_display() {
        let err = ScanError::NoReadableTile {
            path: PathBuf::from("0/0.png"),
            reason: "bad magic".to_string(),
        };
        assert!(err.to_string().contains("0/0.png"));
        assert!(err.to_string().contains("bad magic"));
    }
}
