//! webmconv - two-pass WebM converter
//!
//! # Usage
//!
//! ```bash
//! webmconv convert --input "clip.mp4" --size 8 --fps 60 --half-res
//! webmconv inspect --input "clip.mp4" --json
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, info};

use webm_converter::cli::{commands, Cli, Commands};
use webm_converter::config_initialization::initialize_configuration_hierarchy;
use webm_converter::utils::logging;
use webm_converter::JobOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = initialize_configuration_hierarchy(&cli)?;
    logging::init(&runtime.logging);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting webmconv");
    match &runtime.config_file {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => debug!("No config file found, using built-in defaults"),
    }
    debug!(
        ffmpeg = %runtime.ffmpeg.display(),
        ffprobe = %runtime.ffprobe.display(),
        "Resolved tools"
    );

    match cli.command {
        Commands::Convert(args) => match commands::convert(args, &runtime).await? {
            JobOutcome::Completed { .. } => Ok(()),
            JobOutcome::Failed(reason) => bail!("Conversion failed: {}", reason),
            JobOutcome::Cancelled => bail!("Conversion cancelled"),
        },
        Commands::Inspect(args) => commands::inspect(args, &runtime).await,
    }
}
