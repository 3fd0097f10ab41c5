// Domain rules - Bitrate, filter and progress policies

use crate::domain::model::*;
use crate::error::{ConvertError, ConvertResult};


/// Headroom applied to the calculated bitrate against encoder overshoot
/// and container/audio overhead
pub const SAFETY_MARGIN: f64 = 0.96;

/// Target bitrate derivation from file size and duration
pub struct BitrateCalculator;

impl BitrateCalculator {
    /// Kilobits per second that fill `target_size_mb` over `duration_seconds`
    pub fn target_bitrate_kbps(target_size_mb: f64, duration_seconds: f64) -> ConvertResult<f64> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
            return Err(ConvertError::InvalidInput(format!(
                "Duration must be positive, got {} seconds",
                duration_seconds
            )));
        }
        if !target_size_mb.is_finite() || target_size_mb <= 0.0 {
            return Err(ConvertError::InvalidInput(format!(
                "Target size must be positive, got {} MB",
                target_size_mb
            )));
        }

        let size_kilobytes = target_size_mb * 1024.0;
        Ok(size_kilobytes * 8.0 / duration_seconds)
    }

    /// Bitrate actually handed to the encoder for both passes
    pub fn encode_bitrate_kbps(target_size_mb: f64, duration_seconds: f64) -> ConvertResult<f64> {
        Ok(Self::target_bitrate_kbps(target_size_mb, duration_seconds)? * SAFETY_MARGIN)
    }

    /// Encoder argument form, kilobits with a `k` suffix
    pub fn format_kbps(bitrate_kbps: f64) -> String {
        format!("{:.1}k", bitrate_kbps)
    }
}

/// Output frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleDims {
    pub width: u32,
    pub height: u32,
}

impl ScaleDims {
    /// Source size, or half of it (integer division) when requested
    pub fn for_source(media_info: &MediaInfo, halve_resolution: bool) -> Self {
        if halve_resolution {
            Self {
                width: (media_info.width / 2).max(1),
                height: (media_info.height / 2).max(1),
            }
        } else {
            Self {
                width: media_info.width,
                height: media_info.height,
            }
        }
    }
}

/// Video filter chain: scale first, then retime
pub struct FilterChain;

impl FilterChain {
    pub fn build(dims: ScaleDims, framerate: u32) -> String {
        format!(
            "scale={}:{},fps=fps={}",
            dims.width, dims.height, framerate
        )
    }

    pub fn for_job(media_info: &MediaInfo, config: &EncodeConfig) -> String {
        Self::build(
            ScaleDims::for_source(media_info, config.halve_resolution),
            config.target_framerate,
        )
    }
}

/// Percent of `duration_seconds` covered by `elapsed_seconds`, floored and
/// clamped to 0..=100
pub fn progress_percent(elapsed_seconds: f64, duration_seconds: f64) -> u8 {
    if duration_seconds <= 0.0 || !elapsed_seconds.is_finite() {
        return 0;
    }
    let percent = (elapsed_seconds / duration_seconds * 100.0).floor();
    percent.clamp(0.0, 100.0) as u8
}
