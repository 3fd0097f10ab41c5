//! Single-flight conversion controller
//!
//! Accepts one conversion at a time, probes the input, then hands the encode
//! to a background task. Callers follow the job through a [`JobEvent`]
//! stream, a `watch` snapshot of the latest state, and the [`JobHandle`].

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::engine::EncodeJob;
use crate::error::{ConvertError, ConvertResult};
use crate::ports::{EncoderPort, JobObserver, ProbePort};

/// Event delivered to the shell driving the controller
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Progress(ProgressReport),
    StateChanged(JobSnapshot),
    Completed { job_id: JobId, outcome: JobOutcome },
}

impl JobEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            JobEvent::Progress(report) => report.job_id,
            JobEvent::StateChanged(snapshot) => snapshot.id,
            JobEvent::Completed { job_id, .. } => *job_id,
        }
    }
}

/// Handle to an accepted job
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<JobOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Request cancellation; the running encoder pass is killed
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal outcome
    pub async fn wait(self) -> JobOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed(ConvertError::WorkerAborted(e.to_string())),
        }
    }
}

type CancelSlot = Arc<Mutex<Option<CancellationToken>>>;

fn lock_slot(
    slot: &Mutex<Option<CancellationToken>>,
) -> MutexGuard<'_, Option<CancellationToken>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the single-flight slot when the job's owner goes away, panics
/// included. The cancel slot is emptied before the busy flag clears, so a
/// later `cancel()` never reaches a finished job's token.
struct BusyGuard {
    busy: Arc<AtomicBool>,
    active_cancel: CancelSlot,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut slot = lock_slot(&self.active_cancel);
        *slot = None;
        self.busy.store(false, Ordering::Release);
    }
}

/// Forwards job callbacks to the controller's event stream and state cell
struct EventRelay {
    job_id: JobId,
    events: mpsc::UnboundedSender<JobEvent>,
    state: Arc<watch::Sender<Option<JobSnapshot>>>,
    last_progress: Option<(Pass, u8)>,
}

impl EventRelay {
    fn publish_state(&self, state: JobState) {
        let snapshot = JobSnapshot {
            id: self.job_id,
            state,
        };
        self.state.send_replace(Some(snapshot));
        // A shell that stopped listening must not stop the job
        let _ = self.events.send(JobEvent::StateChanged(snapshot));
    }

    fn complete(&self, outcome: JobOutcome) {
        self.publish_state(outcome.state());
        let _ = self.events.send(JobEvent::Completed {
            job_id: self.job_id,
            outcome,
        });
    }
}

impl JobObserver for EventRelay {
    fn on_progress(&mut self, report: ProgressReport) {
        let key = (report.pass, report.percent);
        if self.last_progress == Some(key) {
            return;
        }
        self.last_progress = Some(key);
        let _ = self.events.send(JobEvent::Progress(report));
    }

    fn on_state_change(&mut self, _job_id: JobId, state: JobState) {
        self.publish_state(state);
    }
}

/// Runs at most one conversion at a time
pub struct ConversionController {
    probe: Arc<dyn ProbePort>,
    encoder: Arc<dyn EncoderPort>,
    busy: Arc<AtomicBool>,
    next_id: AtomicU64,
    state: Arc<watch::Sender<Option<JobSnapshot>>>,
    events: mpsc::UnboundedSender<JobEvent>,
    active_cancel: CancelSlot,
}

impl ConversionController {
    /// Create a controller and the receiving end of its event stream
    pub fn new(
        probe: Arc<dyn ProbePort>,
        encoder: Arc<dyn EncoderPort>,
    ) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(None);

        let controller = Self {
            probe,
            encoder,
            busy: Arc::new(AtomicBool::new(false)),
            next_id: AtomicU64::new(1),
            state: Arc::new(state),
            events,
            active_cancel: Arc::new(Mutex::new(None)),
        };
        (controller, receiver)
    }

    /// True while a job is between acceptance and its terminal state
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Latest state of the most recent job
    pub fn current(&self) -> Option<JobSnapshot> {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<Option<JobSnapshot>> {
        self.state.subscribe()
    }

    /// Cancel the active job, if any. Returns whether a job was signalled.
    pub fn cancel(&self) -> bool {
        match lock_slot(&self.active_cancel).as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Accept a conversion, probe its input and start encoding in the background.
    ///
    /// Returns [`ConvertError::Busy`] without side effects while another job
    /// is active. Probe failures end the job as `Failed` before any encoder
    /// is spawned and are also returned to the caller.
    pub async fn start_conversion(&self, request: ConversionRequest) -> ConvertResult<JobHandle> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(input = %request.input.display(), "Rejected conversion, another job is active");
            return Err(ConvertError::Busy);
        }
        let guard = BusyGuard {
            busy: Arc::clone(&self.busy),
            active_cancel: Arc::clone(&self.active_cancel),
        };

        let job_id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        *lock_slot(&self.active_cancel) = Some(cancel.clone());
        let output = request.resolved_output();
        let mut relay = EventRelay {
            job_id,
            events: self.events.clone(),
            state: Arc::clone(&self.state),
            last_progress: None,
        };

        info!(
            job_id = %job_id,
            input = %request.input.display(),
            output = %output.display(),
            "Conversion accepted"
        );
        relay.on_state_change(job_id, JobState::Created);

        let media_info = match self.prepare(&request, &mut relay).await {
            Ok(media_info) => media_info,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Conversion rejected before encoding");
                drop(guard);
                relay.complete(JobOutcome::Failed(e.clone()));
                return Err(e);
            }
        };

        let job = EncodeJob::new(job_id, Arc::clone(&self.encoder));
        let token = cancel.clone();
        let input = request.input;
        let config = request.config;

        let task = tokio::spawn(async move {
            let run = job.run(&input, &output, &config, &media_info, &mut relay, &token);
            let outcome = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(job_id = %job_id, "Encode worker panicked");
                    JobOutcome::Failed(ConvertError::WorkerAborted("encode task panicked".to_string()))
                }
            };

            drop(guard);
            relay.complete(outcome.clone());
            outcome
        });

        Ok(JobHandle {
            id: job_id,
            cancel,
            task,
        })
    }

    async fn prepare(
        &self,
        request: &ConversionRequest,
        relay: &mut EventRelay,
    ) -> ConvertResult<MediaInfo> {
        request.config.validate()?;
        if !tokio::fs::try_exists(&request.input).await.unwrap_or(false) {
            return Err(ConvertError::InputMissing {
                path: request.input.clone(),
            });
        }

        let job_id = relay.job_id;
        relay.on_state_change(job_id, JobState::Probing);
        let probed = self.probe.probe(&request.input).await?;
        let media_info = MediaInfo::new(probed.duration_seconds, probed.width, probed.height)?;
        debug!(
            job_id = %job_id,
            duration_seconds = media_info.duration_seconds,
            width = media_info.width,
            height = media_info.height,
            "Probed input"
        );
        Ok(media_info)
    }
}
