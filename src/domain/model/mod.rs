// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, ConvertResult};


/// One of the two encoder passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {
    /// Analysis pass, output discarded
    First,
    /// Final pass, writes the real output
    Second,
}

impl Pass {
    /// Pass number as the encoder expects it
    pub fn number(self) -> u8 {
        match self {
            Pass::First => 1,
            Pass::Second => 2,
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl Serialize for Pass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

/// VPx codec family used for the WebM output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecProfile {
    #[default]
    Vp8,
    Vp9,
}

impl CodecProfile {
    /// Parse a codec profile from its short name
    pub fn parse(name: &str) -> ConvertResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "vp8" => Ok(CodecProfile::Vp8),
            "vp9" => Ok(CodecProfile::Vp9),
            other => Err(ConvertError::InvalidInput(format!(
                "Unknown codec profile: {}. Valid profiles: vp8, vp9",
                other
            ))),
        }
    }

    /// ffmpeg encoder name for this profile
    pub fn encoder_name(self) -> &'static str {
        match self {
            CodecProfile::Vp8 => "libvpx",
            CodecProfile::Vp9 => "libvpx-vp9",
        }
    }
}

impl fmt::Display for CodecProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecProfile::Vp8 => write!(f, "vp8"),
            CodecProfile::Vp9 => write!(f, "vp9"),
        }
    }
}

/// Upload-limit presets offered by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePreset {
    Mb3,
    Mb4,
    Mb8,
}

impl SizePreset {
    pub fn parse(value: &str) -> ConvertResult<Self> {
        match value.trim() {
            "3" => Ok(SizePreset::Mb3),
            "4" => Ok(SizePreset::Mb4),
            "8" => Ok(SizePreset::Mb8),
            other => Err(ConvertError::InvalidInput(format!(
                "Unsupported target size: {} MB. Valid sizes: 3, 4, 8",
                other
            ))),
        }
    }

    pub fn megabytes(self) -> f64 {
        match self {
            SizePreset::Mb3 => 3.0,
            SizePreset::Mb4 => 4.0,
            SizePreset::Mb8 => 8.0,
        }
    }
}

/// Output framerate presets offered by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameratePreset {
    Fps30,
    Fps60,
}

impl FrameratePreset {
    pub fn parse(value: &str) -> ConvertResult<Self> {
        match value.trim() {
            "30" => Ok(FrameratePreset::Fps30),
            "60" => Ok(FrameratePreset::Fps60),
            other => Err(ConvertError::InvalidInput(format!(
                "Unsupported framerate: {}. Valid framerates: 30, 60",
                other
            ))),
        }
    }

    pub fn fps(self) -> u32 {
        match self {
            FrameratePreset::Fps30 => 30,
            FrameratePreset::Fps60 => 60,
        }
    }
}

/// Per-job encode settings, snapshotted when the job starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Desired final file size in megabytes
    pub target_size_mb: f64,
    /// Output framerate
    pub target_framerate: u32,
    /// Halve source width and height (integer division)
    pub halve_resolution: bool,
    /// Encode no audio stream
    pub strip_audio: bool,
    /// Codec family
    pub codec_profile: CodecProfile,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            target_size_mb: SizePreset::Mb3.megabytes(),
            target_framerate: FrameratePreset::Fps30.fps(),
            halve_resolution: false,
            strip_audio: false,
            codec_profile: CodecProfile::Vp8,
        }
    }
}

impl EncodeConfig {
    /// Check the positivity constraints on size and framerate
    pub fn validate(&self) -> ConvertResult<()> {
        if !self.target_size_mb.is_finite() || self.target_size_mb <= 0.0 {
            return Err(ConvertError::InvalidInput(format!(
                "Target size must be a positive number of megabytes, got {}",
                self.target_size_mb
            )));
        }
        if self.target_framerate == 0 {
            return Err(ConvertError::InvalidInput(
                "Target framerate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Source media facts needed to plan an encode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
}

impl MediaInfo {
    /// Create media info, rejecting a non-positive duration or empty dimensions
    pub fn new(duration_seconds: f64, width: u32, height: u32) -> ConvertResult<Self> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(ConvertError::InvalidInput(format!(
                "Duration must be positive, got {} seconds",
                duration_seconds
            )));
        }
        if width == 0 || height == 0 {
            return Err(ConvertError::InvalidInput(
                "Video dimensions cannot be zero".to_string(),
            ));
        }
        Ok(Self {
            duration_seconds,
            width,
            height,
        })
    }
}

/// Process-unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Job lifecycle: Created -> Probing -> Encoding(1) -> Encoding(2) -> terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "pass", rename_all = "snake_case")]
pub enum JobState {
    Created,
    Probing,
    Encoding(Pass),
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Created => write!(f, "created"),
            JobState::Probing => write!(f, "probing"),
            JobState::Encoding(pass) => write!(f, "encoding (pass {})", pass),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Live progress of one encoder pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub job_id: JobId,
    pub pass: Pass,
    /// 0..=100, non-decreasing within a pass
    pub percent: u8,
    /// Encoder timestamp of the line that produced this report
    pub elapsed_time_seconds: f64,
}

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Completed { output: PathBuf, size_bytes: u64 },
    Failed(ConvertError),
    Cancelled,
}

impl JobOutcome {
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Completed { .. } => JobState::Completed,
            JobOutcome::Failed(_) => JobState::Failed,
            JobOutcome::Cancelled => JobState::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }

    /// Human-readable status line for the shell
    pub fn message(&self) -> String {
        match self {
            JobOutcome::Completed { output, size_bytes } => format!(
                "Conversion completed: {} ({})",
                output.display(),
                crate::utils::format_file_size(*size_bytes)
            ),
            JobOutcome::Failed(reason) => format!("Conversion failed: {}", reason),
            JobOutcome::Cancelled => "Conversion cancelled".to_string(),
        }
    }
}

/// Latest known state of the controller's job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub state: JobState,
}

/// What the shell shows after a file is picked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSelection {
    pub display_name: String,
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub suggested_output: PathBuf,
}

/// A request to convert one file
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: PathBuf,
    /// Explicit output path; derived from the input when `None`
    pub output: Option<PathBuf>,
    pub config: EncodeConfig,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, config: EncodeConfig) -> Self {
        Self {
            input: input.into(),
            output: None,
            config,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Output path this request will write to
    pub fn resolved_output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| crate::utils::path::default_output_path(&self.input))
    }
}
