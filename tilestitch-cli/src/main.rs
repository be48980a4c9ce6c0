//! tilestitch CLI - Command-line interface
//!
//! Stitches a `<input>/<row>/<col>.<ext>` tile tree into one image.

mod error;
mod progress;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use tilestitch::app::{run_merge, MergeConfig};
use tilestitch::config::{default_config_path, parse_size, ConfigFile};
use tilestitch::logging::{init_logging, DEFAULT_LOG_LEVEL};
use tilestitch::output::{CompressionMethod, WriterChoice};
use tracing::debug;

use error::CliError;
use progress::MergeProgress;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    /// Deflate (zlib) compressed tiles
    Deflate,
    /// Uncompressed tiles
    None,
}

impl From<CompressionArg> for CompressionMethod {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Deflate => CompressionMethod::Deflate,
            CompressionArg::None => CompressionMethod::None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WriterArg {
    /// Tiled TIFF for .tif/.tiff outputs, in-memory canvas otherwise
    Auto,
    /// Always stream into a tiled BigTIFF
    Tiled,
    /// Always assemble the full image in memory
    Canvas,
}

impl From<WriterArg> for WriterChoice {
    fn from(arg: WriterArg) -> Self {
        match arg {
            WriterArg::Auto => WriterChoice::Auto,
            WriterArg::Tiled => WriterChoice::Tiled,
            WriterArg::Canvas => WriterChoice::Canvas,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tilestitch", version)]
#[command(about = "Stitch a directory grid of image tiles into one tiled BigTIFF", long_about = None)]
struct Args {
    /// Input directory containing <row>/<col>.<ext> tiles
    #[arg(short, long)]
    input: PathBuf,

    /// Output image (.tif/.tiff streams a tiled BigTIFF)
    #[arg(short, long)]
    output: PathBuf,

    /// Tiles smaller than this are treated as empty (e.g. 100, 2K, 1MB)
    #[arg(long, value_parser = parse_min_size)]
    min_size: Option<u64>,

    /// TIFF tile compression
    #[arg(long, value_enum)]
    compression: Option<CompressionArg>,

    /// Deflate level from 0 (fastest) to 9 (smallest)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    compression_level: Option<u32>,

    /// Output writer
    #[arg(long, value_enum)]
    writer: Option<WriterArg>,

    /// Configuration file (default: <config dir>/tilestitch/config.ini if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Do not show a progress bar
    #[arg(long)]
    no_progress: bool,
}

fn parse_min_size(value: &str) -> Result<u64, String> {
    parse_size(value).map_err(|e| e.to_string())
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version are reported through the error path too.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(args) {
        e.exit();
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config_file = load_config(args.config.as_deref())?;

    let level = log_level(args.verbose, args.quiet, config_file.logging.level.as_deref());
    let _logging_guard = init_logging(level, args.log_file.as_deref())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;
    debug!(?args, "Parsed arguments");

    let config = build_config(&args, &config_file);
    let progress = MergeProgress::new(!args.no_progress && !args.quiet);

    match run_merge(&config, |p| progress.update(p)) {
        Ok(report) => {
            progress.finish();
            println!("{}", report);
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            Err(e.into())
        }
    }
}

/// Load the explicit config file, or the default one if it exists.
fn load_config(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    match explicit {
        Some(path) if !path.exists() => Err(CliError::Config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => Ok(ConfigFile::load_from(path)?),
        None => match default_config_path() {
            Some(path) => Ok(ConfigFile::load_from(&path)?),
            None => Ok(ConfigFile::default()),
        },
    }
}

/// Flags win over the config file, which wins over defaults.
fn build_config(args: &Args, file: &ConfigFile) -> MergeConfig {
    let mut config = MergeConfig::new(&args.input, &args.output).with_config_file(file);

    if let Some(bytes) = args.min_size {
        config = config.with_min_tile_bytes(bytes);
    }
    if let Some(compression) = args.compression {
        config = config.with_compression(compression.into());
    }
    if let Some(level) = args.compression_level {
        config = config.with_compression_level(level);
    }
    if let Some(writer) = args.writer {
        config = config.with_writer(writer.into());
    }
    config
}

fn log_level(verbose: u8, quiet: bool, configured: Option<&str>) -> &str {
    match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => configured.unwrap_or(DEFAULT_LOG_LEVEL),
        (false, 1) => "debug",
        (false, _) => "trace",
    }
}
