//! tilestitch - Sparse tile grid mosaic assembler
//!
//! Assembles a directory tree of square tiles laid out as
//! `<root>/<row>/<col>.<ext>` into one large image. The grid's bounding box is
//! computed over every row and column found, gaps are filled with white, and
//! tiles are streamed in row-major order into a tiled, compressed BigTIFF so
//! the full image never has to fit in memory.
//!
//! # Modules
//!
//! - [`locator`] - Numeric row/column discovery on disk
//! - [`grid`] - Bounding-box scan and tile edge detection
//! - [`tile`] - Per-cell resolution with size, decode and uniformity filters
//! - [`stream`] - Lazy row-major tile sequence
//! - [`output`] - Tiled TIFF and in-memory canvas writers
//! - [`app`] - One-call merge facade
//! - [`config`] - INI config file and size parsing
//! - [`logging`] - Subscriber setup for binaries

pub mod app;
pub mod config;
pub mod coord;
pub mod grid;
pub mod locator;
pub mod logging;
pub mod output;
pub mod stream;
pub mod tile;

/// Version of the tilestitch library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
