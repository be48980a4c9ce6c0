//! Tile discovery on disk.
//!
//! Tiles are laid out as `<root>/<row>/<col>.<ext>` where `<row>` and `<col>`
//! are non-negative decimal integers. Anything else under the root (hidden
//! files, `Thumbs.db`, non-numeric folders, nested directories) is ignored.
//!
//! Listing is deliberately lenient: an unreadable row directory yields an
//! empty column map instead of an error, so the row simply renders as filler
//! downstream. Only an unreadable root is reported to the caller.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A tile file discovered inside a row directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFile {
    path: PathBuf,
    size: u64,
}

impl TileFile {
    /// Create a tile file record.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Full path to the tile.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes, as reported when the row was listed.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Column index → tile file for one row directory.
pub type ColumnMap = BTreeMap<u32, TileFile>;

/// Row index → row directory path.
pub type RowMap = BTreeMap<u32, PathBuf>;

/// Parse a grid index from a directory name or file stem.
///
/// Only non-empty strings made entirely of ASCII digits qualify. Leading
/// zeros are accepted (`"007"` → 7). Values that overflow `u32` are rejected.
///
/// # Examples
///
/// ```
/// use tilestitch::locator::parse_index;
///
/// assert_eq!(parse_index("42"), Some(42));
/// assert_eq!(parse_index("007"), Some(7));
/// assert_eq!(parse_index("-1"), None);
/// assert_eq!(parse_index("12a"), None);
/// assert_eq!(parse_index(""), None);
/// ```
pub fn parse_index(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

fn parse_os_index(name: &OsStr) -> Option<u32> {
    name.to_str().and_then(parse_index)
}

/// List the numeric row directories directly under `root`.
///
/// # Errors
///
/// Returns the underlying I/O error if `root` cannot be read.
pub fn list_rows(root: &Path) -> Result<RowMap, io::Error> {
    let mut rows = RowMap::new();

    for entry in fs::read_dir(root)?.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        match parse_os_index(&entry.file_name()) {
            Some(row) => {
                // "7" and "007" collide; keep the lexicographically smaller name
                let keep_existing = rows
                    .get(&row)
                    .is_some_and(|existing| existing.file_name() <= path.file_name());
                if keep_existing {
                    debug!(row, ignored = %path.display(), "Duplicate row directory");
                } else {
                    rows.insert(row, path);
                }
            }
            None => debug!(path = %path.display(), "Skipping non-numeric directory"),
        }
    }

    Ok(rows)
}

/// List the numeric tile files directly inside a row directory.
///
/// A file qualifies when its stem (name minus the last extension) is numeric.
/// When several files share the same numeric stem (`3.jpg`, `3.png`,
/// `003.png`) the one with the lexicographically smallest file name wins.
///
/// An unreadable directory is logged and yields an empty map.
pub fn list_columns(row_dir: &Path) -> ColumnMap {
    let entries = match fs::read_dir(row_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                path = %row_dir.display(),
                error = %e,
                "Row directory unreadable, treating as empty"
            );
            return ColumnMap::new();
        }
    };

    let mut columns = ColumnMap::new();

    for entry in entries.flatten() {
        let path = entry.path();
        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            _ => continue,
        };

        let Some(col) = path.file_stem().and_then(parse_os_index) else {
            debug!(path = %path.display(), "Skipping non-numeric file");
            continue;
        };

        let keep_existing = columns
            .get(&col)
            .is_some_and(|existing| existing.path.file_name() <= path.file_name());
        if keep_existing {
            debug!(col, ignored = %path.display(), "Duplicate column stem");
        } else {
            columns.insert(col, TileFile::new(path, metadata.len()));
        }
    }

    columns
}
