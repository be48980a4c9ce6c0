//! Merge configuration.
//!
//! `MergeConfig` is the single settings object passed to [`run_merge`]. It
//! starts from built-in defaults; the CLI overlays the config file with
//! [`MergeConfig::with_config_file`] and then its own flags with the `with_*`
//! setters, which gives flag > file > default precedence.
//!
//! [`run_merge`]: super::run_merge

use std::path::{Path, PathBuf};

use super::MergeError;
use crate::config::ConfigFile;
use crate::output::{
    is_tiff_path, CompressionMethod, TiffCompression, WriterChoice, DEFAULT_COMPRESSION_LEVEL,
    MAX_COMPRESSION_LEVEL,
};
use crate::tile::DEFAULT_MIN_TILE_BYTES;

/// Settings for one merge run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeConfig {
    input: PathBuf,
    output: PathBuf,
    min_tile_bytes: u64,
    compression: CompressionMethod,
    compression_level: u32,
    writer: WriterChoice,
}

impl MergeConfig {
    /// Create a config with default settings.
    ///
    /// # Arguments
    ///
    /// * `input` - Root directory holding `<row>/<col>.<ext>` tiles
    /// * `output` - Path of the image to write
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            min_tile_bytes: DEFAULT_MIN_TILE_BYTES,
            compression: CompressionMethod::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            writer: WriterChoice::default(),
        }
    }

    /// Overlay every value the config file sets.
    pub fn with_config_file(mut self, file: &ConfigFile) -> Self {
        if let Some(bytes) = file.merge.min_size {
            self.min_tile_bytes = bytes;
        }
        if let Some(writer) = file.merge.writer {
            self.writer = writer;
        }
        if let Some(method) = file.output.compression {
            self.compression = method;
        }
        if let Some(level) = file.output.compression_level {
            self.compression_level = level;
        }
        self
    }

    /// Set the minimum tile file size in bytes.
    pub fn with_min_tile_bytes(mut self, bytes: u64) -> Self {
        self.min_tile_bytes = bytes;
        self
    }

    /// Set the TIFF compression method.
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }

    /// Set the deflate level, 0-9.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set which writer produces the output.
    pub fn with_writer(mut self, writer: WriterChoice) -> Self {
        self.writer = writer;
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn min_tile_bytes(&self) -> u64 {
        self.min_tile_bytes
    }

    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    pub fn compression_level(&self) -> u32 {
        self.compression_level
    }

    pub fn writer(&self) -> WriterChoice {
        self.writer
    }

    /// Compression handed to the tiled writer.
    pub fn tiff_compression(&self) -> TiffCompression {
        TiffCompression::from_method(self.compression, self.compression_level)
    }

    /// Check settings that cannot be validated one at a time.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfig`] for an out-of-range compression
    /// level, or when the tiled writer is forced onto a non-TIFF path.
    pub fn validate(&self) -> Result<(), MergeError> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(MergeError::InvalidConfig(format!(
                "compression level {} is out of range 0-{}",
                self.compression_level, MAX_COMPRESSION_LEVEL
            )));
        }
        if self.writer == WriterChoice::Tiled && !is_tiff_path(&self.output) {
            return Err(MergeError::InvalidConfig(format!(
                "the tiled writer needs a .tif or .tiff output, got {}",
                self.output.display()
            )));
        }
        Ok(())
    }
}
