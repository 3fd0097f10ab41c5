// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod probe_ffprobe;
pub mod toml_config;

// Re-export adapters
pub use exec_ffmpeg::FfmpegAdapter;
pub use probe_ffprobe::FfprobeAdapter;
pub use toml_config::{Settings, TomlConfigAdapter};
