//! Human-readable byte sizes such as "100", "4K" or "2MB".

use thiserror::Error;

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected bytes or a value like '512', '4K' or '2MB'")]
pub struct SizeParseError {
    input: String,
}

impl SizeParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// The rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Parse a size string into bytes.
///
/// Bare numbers are bytes. `K`/`KB`, `M`/`MB` and `G`/`GB` suffixes are
/// binary multiples, case-insensitive, with optional whitespace before the
/// suffix.
///
/// # Examples
///
/// ```
/// use tilestitch::config::parse_size;
///
/// assert_eq!(parse_size("100").unwrap(), 100);
/// assert_eq!(parse_size("4k").unwrap(), 4096);
/// assert_eq!(parse_size("1 MB").unwrap(), 1024 * 1024);
/// assert!(parse_size("ten").is_err());
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (number, multiplier) = [("GB", GB), ("G", GB), ("MB", MB), ("M", MB), ("KB", KB), ("K", KB)]
        .iter()
        .find_map(|&(suffix, multiplier)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim_end(), multiplier))
        })
        .unwrap_or((upper.as_str(), 1));

    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SizeParseError::new(s));
    }

    number
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| SizeParseError::new(s))
}

/// Format a byte count using the largest exact binary suffix.
///
/// # Examples
///
/// ```
/// use tilestitch::config::format_size;
///
/// assert_eq!(format_size(100), "100");
/// assert_eq!(format_size(2048), "2KB");
/// assert_eq!(format_size(3 * 1024 * 1024), "3MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}
