//! Size-capped WebM conversion
//!
//! Probes a video with ffprobe, derives the video bitrate that makes the
//! output fit a target size, and runs ffmpeg twice (analysis, then final
//! encode) with live progress and cancellation. One job runs at a time.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{ConversionController, InspectInteractor, JobEvent, JobHandle};
pub use domain::errors::{ProbeError, ProbeErrorKind};
pub use domain::model::{
    CodecProfile, ConversionRequest, EncodeConfig, FileSelection, JobId, JobOutcome, JobSnapshot,
    JobState, MediaInfo, Pass, ProgressReport,
};
pub use domain::rules::BitrateCalculator;
pub use engine::EncodeJob;
pub use error::{ConvertError, ConvertResult};
