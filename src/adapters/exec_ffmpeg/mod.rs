//! FFmpeg execution adapter
//!
//! Runs one encoder pass as a child process, streaming its diagnostic
//! output line by line and killing it when the job is cancelled.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::process::{Child, ChildStderr, Command};
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::domain::model::Pass;
use crate::error::{ConvertError, ConvertResult};
use crate::ports::{EncoderPort, PassExit};

/// Longest diagnostic line kept before the reader gives up splitting
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// FFmpeg-based execution adapter
#[derive(Debug, Clone)]
pub struct FfmpegAdapter {
    ffmpeg_path: PathBuf,
}

impl FfmpegAdapter {
    /// Create an adapter for the given ffmpeg path
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    pub fn ffmpeg_path(&self) -> &Path {
        &self.ffmpeg_path
    }
}

#[async_trait]
impl EncoderPort for FfmpegAdapter {
    async fn run_pass(
        &self,
        pass: Pass,
        args: &[String],
        cancel: &CancellationToken,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> ConvertResult<PassExit> {
        debug!(pass = %pass, tool = %self.ffmpeg_path.display(), ?args, "Spawning encoder");

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        detach_from_console_signals(&mut command);

        let mut child = command
            .spawn()
            .map_err(|e| ConvertError::EncoderLaunchFailed {
                pass,
                message: format!("{}: {}", self.ffmpeg_path.display(), e),
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConvertError::EncoderLaunchFailed {
                pass,
                message: "encoder stderr was not captured".to_string(),
            })?;

        // Status lines end in '\r', log lines in '\n'
        let codec = AnyDelimiterCodec::new_with_max_length(
            b"\r\n".to_vec(),
            Vec::new(),
            MAX_LINE_LENGTH,
        );
        let mut lines = FramedRead::new(stderr, codec);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return kill(pass, &mut child).await;
                }
                frame = lines.next() => match frame {
                    Some(Ok(bytes)) => {
                        if bytes.is_empty() {
                            continue;
                        }
                        let line = String::from_utf8_lossy(&bytes);
                        trace!(target: "ffmpeg", pass = %pass, "{}", line);
                        on_line(&line);
                    }
                    Some(Err(e)) => {
                        warn!(pass = %pass, error = %e, "Unreadable encoder output, discarding the rest");
                        if drain(lines.into_inner(), cancel).await.is_none() {
                            return kill(pass, &mut child).await;
                        }
                        break;
                    }
                    None => break,
                },
            }
        }

        // Stream ended; the process may still be finalizing its output
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return kill(pass, &mut child).await;
            }
            status = child.wait() => status.map_err(|e| ConvertError::EncoderLaunchFailed {
                pass,
                message: format!("failed waiting for encoder: {}", e),
            })?,
        };

        debug!(pass = %pass, %status, "Encoder exited");
        Ok(PassExit::Exited(status.code()))
    }
}

/// Keep a terminal interrupt from reaching the encoder directly; the job's
/// cancellation token decides how it stops
#[cfg(unix)]
fn detach_from_console_signals(command: &mut Command) {
    command.process_group(0);
}

#[cfg(windows)]
fn detach_from_console_signals(command: &mut Command) {
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_console_signals(_command: &mut Command) {}

/// Kill the child and reap it so no orphan keeps writing the output
async fn kill(pass: Pass, child: &mut Child) -> ConvertResult<PassExit> {
    warn!(pass = %pass, "Cancellation requested, killing encoder");
    if let Err(e) = child.kill().await {
        warn!(pass = %pass, error = %e, "Failed to kill encoder");
    }
    Ok(PassExit::Cancelled)
}

/// Read and discard the remaining stderr; `None` if cancelled first
async fn drain(mut stderr: ChildStderr, cancel: &CancellationToken) -> Option<()> {
    let mut sink = tokio::io::sink();
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        _ = tokio::io::copy(&mut stderr, &mut sink) => Some(()),
    }
}
