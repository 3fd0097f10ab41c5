//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: input with a .webm extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target file size in megabytes
    #[arg(long, value_parser = ["3", "4", "8"])]
    pub size: Option<String>,

    /// Output framerate
    #[arg(long, value_parser = ["30", "60"])]
    pub fps: Option<String>,

    /// Halve the source width and height
    #[arg(long)]
    pub half_res: bool,

    /// Drop the audio track
    #[arg(long)]
    pub no_audio: bool,

    /// Video codec family
    #[arg(long, value_parser = ["vp8", "vp9"])]
    pub codec: Option<String>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
