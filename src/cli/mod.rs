//! CLI module for webmconv
//!
//! Command-line parsing and command execution for the conversion shell.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{ConvertArgs, InspectArgs};

/// Two-pass WebM converter
///
/// Re-encodes a video into a WebM file that fits a target size, such as an
/// upload limit, by running the encoder twice at a computed bitrate.
#[derive(Parser, Debug)]
#[command(name = "webmconv")]
#[command(about = "Convert videos to size-constrained WebM files")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, env = "WEBMCONV_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit log records as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Settings file (default: webmconv.toml, then %APPDATA%/webmconv/config.toml)
    #[arg(long, env = "WEBMCONV_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, env = "WEBMCONV_FFMPEG", global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe executable
    #[arg(long, env = "WEBMCONV_FFPROBE", global = true)]
    pub ffprobe: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a video to a size-constrained WebM file
    Convert(ConvertArgs),
    /// Show what a video would be converted from
    Inspect(InspectArgs),
}
