//! Merge error types.

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::grid::ScanError;
use crate::output::WriteError;

/// Errors that abort a merge run.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Settings that cannot work together, rejected before any I/O.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    ConfigFile(#[from] ConfigFileError),

    /// The input tree could not be turned into a grid.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The output could not be written.
    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),
}
