//! Two-pass encoding engine

use std::path::{Path, PathBuf};

use crate::domain::model::{CodecProfile, EncodeConfig, MediaInfo, Pass};
use crate::domain::rules::{BitrateCalculator, FilterChain};
use crate::error::ConvertResult;
use crate::utils::path::null_sink;

pub mod encode_job;
pub mod progress;

pub use encode_job::EncodeJob;
pub use progress::PassProgress;

/// Audio codec for WebM output when audio is kept
pub const AUDIO_CODEC: &str = "libopus";

/// Audio bitrate for WebM output when audio is kept
pub const AUDIO_BITRATE: &str = "96k";

/// Everything both passes share, fixed before pass 1 starts
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec: CodecProfile,
    /// Bitrate after the safety margin
    pub bitrate_kbps: f64,
    pub filter_chain: String,
    pub strip_audio: bool,
    /// Prefix for the two-pass statistics log
    pub passlog_prefix: PathBuf,
}

impl EncodePlan {
    /// Derive the plan from the job's snapshots
    pub fn new(
        input: &Path,
        output: &Path,
        config: &EncodeConfig,
        media_info: &MediaInfo,
        passlog_prefix: &Path,
    ) -> ConvertResult<Self> {
        let bitrate_kbps =
            BitrateCalculator::encode_bitrate_kbps(config.target_size_mb, media_info.duration_seconds)?;

        Ok(Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            codec: config.codec_profile,
            bitrate_kbps,
            filter_chain: FilterChain::for_job(media_info, config),
            strip_audio: config.strip_audio,
            passlog_prefix: passlog_prefix.to_path_buf(),
        })
    }

    /// Encoder arguments for one pass, as discrete arguments
    pub fn pass_args(&self, pass: Pass) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-y".into(),
            "-i".into(),
            self.input.to_string_lossy().into_owned(),
            "-c:v".into(),
            self.codec.encoder_name().into(),
            "-b:v".into(),
            BitrateCalculator::format_kbps(self.bitrate_kbps),
            "-vf".into(),
            self.filter_chain.clone(),
            "-pass".into(),
            pass.number().to_string(),
            "-passlogfile".into(),
            self.passlog_prefix.to_string_lossy().into_owned(),
        ];

        match pass {
            // The analysis pass never produces a playable file
            Pass::First => {
                args.push("-an".into());
                args.extend(["-f".to_string(), "webm".to_string(), null_sink().to_string()]);
            }
            Pass::Second => {
                if self.strip_audio {
                    args.push("-an".into());
                } else {
                    args.extend([
                        "-c:a".to_string(),
                        AUDIO_CODEC.to_string(),
                        "-b:a".to_string(),
                        AUDIO_BITRATE.to_string(),
                    ]);
                }
                args.extend([
                    "-f".to_string(),
                    "webm".to_string(),
                    self.output.to_string_lossy().into_owned(),
                ]);
            }
        }

        args
    }
}
