//! Optional INI configuration file.
//!
//! ```ini
//! [merge]
//! min_size = 1K
//! writer = auto
//!
//! [output]
//! compression = deflate
//! compression_level = 6
//!
//! [logging]
//! level = info
//! ```
//!
//! Every key is optional. A missing file yields an empty [`ConfigFile`], and
//! unknown sections or keys are ignored.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use thiserror::Error;

use super::size::parse_size;
use crate::output::{CompressionMethod, WriterChoice, MAX_COMPRESSION_LEVEL};

/// Log levels accepted in `[logging] level`.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but could not be read or parsed as INI.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// A key holds a value that cannot be used.
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// `[merge]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSection {
    /// Minimum tile file size in bytes.
    pub min_size: Option<u64>,
    pub writer: Option<WriterChoice>,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSection {
    pub compression: Option<CompressionMethod>,
    pub compression_level: Option<u32>,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSection {
    /// One of [`LOG_LEVELS`], lowercased.
    pub level: Option<String>,
}

/// Values read from the configuration file. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub merge: MergeSection,
    pub output: OutputSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns an empty configuration.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Load the default config file if there is one.
    pub fn load_default() -> Result<Self, ConfigFileError> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }
}

/// `<config_dir>/tilestitch/config.ini`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tilestitch").join("config.ini"))
}

/// Parse an `Ini` document into a `ConfigFile`.
pub(crate) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    if let Some(section) = ini.section(Some("merge")) {
        config.merge.min_size = read(section, "merge", "min_size", |v| {
            parse_size(v).map_err(|e| e.to_string())
        })?;
        config.merge.writer = read(section, "merge", "writer", WriterChoice::from_str)?;
    }

    if let Some(section) = ini.section(Some("output")) {
        config.output.compression =
            read(section, "output", "compression", CompressionMethod::from_str)?;
        config.output.compression_level =
            read(section, "output", "compression_level", parse_level)?;
    }

    if let Some(section) = ini.section(Some("logging")) {
        config.logging.level = read(section, "logging", "level", parse_log_level)?;
    }

    Ok(config)
}

fn read<T>(
    section: &Properties,
    section_name: &str,
    key: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigFileError> {
    let Some(value) = section.get(key) else {
        return Ok(None);
    };
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse(value.trim())
        .map(Some)
        .map_err(|reason| ConfigFileError::InvalidValue {
            section: section_name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason,
        })
}

/// Parse a zlib compression level, 0-9.
pub fn parse_level(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(level) if level <= MAX_COMPRESSION_LEVEL => Ok(level),
        _ => Err(format!("must be a number from 0 to {}", MAX_COMPRESSION_LEVEL)),
    }
}

fn parse_log_level(value: &str) -> Result<String, String> {
    let level = value.to_ascii_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(format!("must be one of: {}", LOG_LEVELS.join(", ")))
    }
}
