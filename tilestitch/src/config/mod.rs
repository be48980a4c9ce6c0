//! Configuration file and value parsing.
//!
//! Settings come from three places, highest priority first: command-line
//! flags, the INI file read into [`ConfigFile`], and built-in defaults. This
//! module only reads the file; [`crate::app::MergeConfig`] holds the merged
//! result.

mod file;
mod size;

pub use file::{
    default_config_path, parse_level, ConfigFile, ConfigFileError, LoggingSection, MergeSection,
    OutputSection, LOG_LEVELS,
};
pub use size::{format_size, parse_size, SizeParseError};
