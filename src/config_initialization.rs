//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use crate::adapters::toml_config::{DefaultSettings, Settings, TomlConfigAdapter};
use crate::cli::{Cli, ConvertArgs};
use crate::domain::model::{CodecProfile, EncodeConfig, FrameratePreset, SizePreset};
use crate::error::{ConvertError, ConvertResult};
use crate::utils::logging::{LogLevel, LoggingConfig};
use crate::utils::path::discover_tool;

/// Settings after applying CLI > env > file > defaults
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub logging: LoggingConfig,
    pub defaults: DefaultSettings,
    /// Settings file that was read; `None` when built-in defaults apply
    pub config_file: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Encode settings for one `convert` invocation
    pub fn encode_config(&self, args: &ConvertArgs) -> ConvertResult<EncodeConfig> {
        let mut config = self.defaults.encode_config();

        if let Some(size) = &args.size {
            config.target_size_mb = SizePreset::parse(size)?.megabytes();
        }
        if let Some(fps) = &args.fps {
            config.target_framerate = FrameratePreset::parse(fps)?.fps();
        }
        if let Some(codec) = &args.codec {
            config.codec_profile = CodecProfile::parse(codec)?;
        }
        config.halve_resolution |= args.half_res;
        config.strip_audio |= args.no_audio;

        config.validate()?;
        Ok(config)
    }
}

/// Load the settings file and merge it with the command line.
///
/// Environment variables reach this point through clap's `env` fallbacks.
pub fn initialize_configuration_hierarchy(cli: &Cli) -> ConvertResult<RuntimeConfig> {
    let settings = TomlConfigAdapter::load_or_default(cli.config.as_deref())?;
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve(cli, settings, &cwd)
}

/// Merge `settings` under the command line; `cwd` is searched for tools
pub fn resolve(cli: &Cli, settings: Settings, cwd: &Path) -> ConvertResult<RuntimeConfig> {
    let Settings {
        tools,
        defaults,
        mut logging,
        source,
    } = settings;

    if let Some(level) = &cli.log_level {
        logging.level = LogLevel::parse(level)
            .ok_or_else(|| ConvertError::Config(format!("Unknown log level: {}", level)))?;
    }
    logging.json |= cli.log_json;

    let ffmpeg = cli
        .ffmpeg
        .clone()
        .or(tools.ffmpeg)
        .unwrap_or_else(|| discover_tool(cwd, "ffmpeg"));
    let ffprobe = cli
        .ffprobe
        .clone()
        .or(tools.ffprobe)
        .unwrap_or_else(|| discover_tool(cwd, "ffprobe"));

    Ok(RuntimeConfig {
        ffmpeg,
        ffprobe,
        logging,
        defaults,
        config_file: source,
    })
}
