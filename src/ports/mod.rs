// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::ProbeError;
use crate::domain::model::*;
use crate::error::ConvertResult;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Duration and resolution of the file's first video stream
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError>;
}

/// How an encoder pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassExit {
    /// Process exited on its own; `None` when terminated by a signal
    Exited(Option<i32>),
    /// Cancellation fired and the process was killed
    Cancelled,
}

impl PassExit {
    pub fn success(self) -> bool {
        matches!(self, PassExit::Exited(Some(0)))
    }
}

/// Port for running one encoder pass
#[async_trait]
pub trait EncoderPort: Send + Sync {
    /// Spawn the encoder with `args`, hand every diagnostic line to
    /// `on_line` as it arrives, and wait for the process to exit.
    ///
    /// When `cancel` fires the process must be killed, not abandoned.
    async fn run_pass(
        &self,
        pass: Pass,
        args: &[String],
        cancel: &CancellationToken,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> ConvertResult<PassExit>;
}

/// Receiver of a job's live progress and state transitions
pub trait JobObserver: Send {
    fn on_progress(&mut self, report: ProgressReport);

    fn on_state_change(&mut self, job_id: JobId, state: JobState);
}
