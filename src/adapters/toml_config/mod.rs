// TOML config adapter - Settings file loading

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::model::{CodecProfile, EncodeConfig, FrameratePreset, SizePreset};
use crate::error::{ConvertError, ConvertResult};
use crate::utils::logging::LoggingConfig;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "webmconv.toml";

/// Everything the settings file may contain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tools: ToolSettings,
    pub defaults: DefaultSettings,
    pub logging: LoggingConfig,
    /// File these settings were read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Explicit locations of the external tools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
}

/// Encode settings used when the command line leaves them out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub target_size_mb: f64,
    pub framerate: u32,
    pub half_resolution: bool,
    pub strip_audio: bool,
    pub codec: CodecProfile,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            target_size_mb: SizePreset::Mb3.megabytes(),
            framerate: FrameratePreset::Fps30.fps(),
            half_resolution: false,
            strip_audio: false,
            codec: CodecProfile::default(),
        }
    }
}

impl DefaultSettings {
    pub fn encode_config(&self) -> EncodeConfig {
        EncodeConfig {
            target_size_mb: self.target_size_mb,
            target_framerate: self.framerate,
            halve_resolution: self.half_resolution,
            strip_audio: self.strip_audio,
            codec_profile: self.codec,
        }
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Candidate files, in lookup order, when no path is given
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(appdata) = std::env::var_os("APPDATA") {
            paths.push(PathBuf::from(appdata).join("webmconv").join("config.toml"));
        }
        paths
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> ConvertResult<Settings> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| ConvertError::Config(format!("Failed to parse TOML config: {}", e)))?;
        settings.defaults.encode_config().validate().map_err(|e| {
            ConvertError::Config(format!("Invalid [defaults] section: {}", e))
        })?;
        Ok(settings)
    }

    /// Load settings from a file that must exist
    pub fn load(path: &Path) -> ConvertResult<Settings> {
        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let mut settings = Self::parse(&content)?;
        settings.source = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Load `explicit` if given, otherwise the first default file found.
    ///
    /// Missing default files fall back to built-in settings.
    pub fn load_or_default(explicit: Option<&Path>) -> ConvertResult<Settings> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ConvertError::Config(format!(
                    "Config file does not exist: {}",
                    path.display()
                )));
            }
            return Self::load(path);
        }

        match Self::default_config_paths()
            .into_iter()
            .find(|path| path.is_file())
        {
            Some(path) => Self::load(&path),
            None => Ok(Settings::default()),
        }
    }
}
