//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and the exit code.

use std::fmt;
use std::process;

use tilestitch::app::MergeError;
use tilestitch::config::ConfigFileError;
use tilestitch::grid::ScanError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file missing or invalid
    Config(String),
    /// The merge itself failed
    Merge(MergeError),
}

impl CliError {
    /// Exit the process with an error message and exit code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Merge(MergeError::Scan(
            ScanError::EmptyGrid(_) | ScanError::RootUnreadable { .. },
        )) = self
        {
            eprintln!();
            eprintln!("Expected input layout:");
            eprintln!("  <input>/<row>/<col>.<ext>   e.g. tiles/0/0.png, tiles/0/1.png, tiles/1/0.png");
            eprintln!("Row directory names and tile file stems must be plain numbers.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Merge(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Merge(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MergeError> for CliError {
    fn from(e: MergeError) -> Self {
        CliError::Merge(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
