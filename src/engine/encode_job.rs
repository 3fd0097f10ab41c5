//! Cancellable two-pass encode of a single file

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::engine::progress::PassProgress;
use crate::engine::EncodePlan;
use crate::error::{ConvertError, ConvertResult};
use crate::ports::{EncoderPort, JobObserver, PassExit};
use crate::utils::format_duration;

/// File name prefix of the two-pass statistics inside the job's temp dir
const PASSLOG_NAME: &str = "ffmpeg2pass";

/// One two-pass encode: pass 1 analyses, pass 2 writes the output.
///
/// Pass 2 is only spawned after pass 1 exited with status 0.
pub struct EncodeJob {
    id: JobId,
    encoder: Arc<dyn EncoderPort>,
}

impl EncodeJob {
    pub fn new(id: JobId, encoder: Arc<dyn EncoderPort>) -> Self {
        Self { id, encoder }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Run both passes and return the terminal outcome.
    ///
    /// The observer sees each `Encoding(pass)` transition and live progress;
    /// relaying the terminal state is left to the caller.
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        config: &EncodeConfig,
        media_info: &MediaInfo,
        observer: &mut dyn JobObserver,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        let started = Instant::now();
        let outcome = match self
            .execute(input, output, config, media_info, observer, cancel)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed(e),
        };

        match &outcome {
            JobOutcome::Completed { size_bytes, .. } => info!(
                job_id = %self.id,
                size_bytes,
                elapsed = %format_duration(started.elapsed()),
                "Encode completed"
            ),
            JobOutcome::Failed(reason) => warn!(job_id = %self.id, %reason, "Encode failed"),
            JobOutcome::Cancelled => info!(job_id = %self.id, "Encode cancelled"),
        }

        outcome
    }

    async fn execute(
        &self,
        input: &Path,
        output: &Path,
        config: &EncodeConfig,
        media_info: &MediaInfo,
        observer: &mut dyn JobObserver,
        cancel: &CancellationToken,
    ) -> ConvertResult<JobOutcome> {
        config.validate()?;
        if cancel.is_cancelled() {
            return Ok(JobOutcome::Cancelled);
        }
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(ConvertError::InputMissing {
                path: input.to_path_buf(),
            });
        }
        if is_same_file(input, output).await {
            return Err(ConvertError::InvalidInput(format!(
                "Output would overwrite the input: {}",
                input.display()
            )));
        }

        let passlog_dir = tempfile::Builder::new()
            .prefix("webmconv-")
            .tempdir()
            .map_err(|e| ConvertError::io(std::env::temp_dir(), e))?;
        let plan = EncodePlan::new(
            input,
            output,
            config,
            media_info,
            &passlog_dir.path().join(PASSLOG_NAME),
        )?;

        remove_stale_output(output).await?;

        info!(
            job_id = %self.id,
            input = %input.display(),
            output = %output.display(),
            codec = %plan.codec,
            bitrate_kbps = plan.bitrate_kbps,
            filters = %plan.filter_chain,
            "Starting two-pass encode"
        );

        for pass in [Pass::First, Pass::Second] {
            if cancel.is_cancelled() {
                return Ok(JobOutcome::Cancelled);
            }

            observer.on_state_change(self.id, JobState::Encoding(pass));
            let mut progress = PassProgress::new(self.id, pass, media_info.duration_seconds);
            let args = plan.pass_args(pass);

            let exit = self
                .encoder
                .run_pass(pass, &args, cancel, &mut |line| {
                    if let Some(report) = progress.observe(line) {
                        observer.on_progress(report);
                    }
                })
                .await?;

            match exit {
                PassExit::Cancelled => return Ok(JobOutcome::Cancelled),
                // An interrupt can reach the encoder before the token is seen
                PassExit::Exited(_) if cancel.is_cancelled() => {
                    return Ok(JobOutcome::Cancelled);
                }
                PassExit::Exited(_) if exit.success() => {
                    debug!(job_id = %self.id, pass = %pass, "Pass finished");
                }
                PassExit::Exited(code) => {
                    return Err(ConvertError::EncoderNonZeroExit { pass, code });
                }
            }
        }

        let size_bytes = tokio::fs::metadata(output)
            .await
            .map_err(|e| ConvertError::io(output, e))?
            .len();

        Ok(JobOutcome::Completed {
            output: output.to_path_buf(),
            size_bytes,
        })
    }
}

/// Whether `output` names the existing file `input`, however it is spelled.
///
/// A missing output is resolved through its parent directory.
async fn is_same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    let Ok(input) = tokio::fs::canonicalize(input).await else {
        return false;
    };
    resolve_output(output).await.is_some_and(|output| output == input)
}

async fn resolve_output(output: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = tokio::fs::canonicalize(output).await {
        return Some(resolved);
    }
    let file_name = output.file_name()?;
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent = tokio::fs::canonicalize(parent).await.ok()?;
    Some(parent.join(file_name))
}

/// Delete a leftover output before the first pass starts
async fn remove_stale_output(output: &Path) -> ConvertResult<()> {
    match tokio::fs::remove_file(output).await {
        Ok(()) => {
            debug!(output = %output.display(), "Removed existing output");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConvertError::io(output, e)),
    }
}
