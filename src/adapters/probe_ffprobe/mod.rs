//! FFprobe adapter for media file probing
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and maps the JSON output into [`MediaInfo`].

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::ProbeError;
use crate::domain::model::MediaInfo;
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FfprobeAdapter {
    ffprobe_path: PathBuf,
}

impl FfprobeAdapter {
    /// Create a prober using the given ffprobe path
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        debug!(tool = %self.ffprobe_path.display(), input = %path.display(), "Probing media file");

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ProbeError::launch_failed(format!(
                    "{}: {}",
                    self.ffprobe_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProbeError::malformed(format!(
                "ffprobe exited with {} for {}",
                output.status,
                path.display()
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Map ffprobe JSON into `MediaInfo`
pub fn parse_probe_output(json: &str) -> Result<MediaInfo, ProbeError> {
    let parsed: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ProbeError::malformed(format!("ffprobe JSON parse error: {}", e)))?;

    let duration = parsed
        .format
        .and_then(|format| format.duration)
        .ok_or_else(|| ProbeError::malformed("format.duration is missing"))?;

    let duration_seconds = match &duration {
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        serde_json::Value::Number(number) => number.as_f64(),
        _ => None,
    }
    .filter(|seconds| seconds.is_finite())
    .ok_or_else(|| {
        ProbeError::malformed(format!("format.duration is not numeric: {}", duration))
    })?;
    if duration_seconds <= 0.0 {
        return Err(ProbeError::malformed(format!(
            "format.duration is not positive: {}",
            duration_seconds
        )));
    }

    let video = parsed
        .streams
        .iter()
        .find(|stream| stream.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ProbeError::no_video_stream("no stream with codec_type video"))?;

    match (video.width, video.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Ok(MediaInfo {
            duration_seconds,
            width,
            height,
        }),
        _ => Err(ProbeError::malformed(
            "video stream has no usable width/height",
        )),
    }
}
