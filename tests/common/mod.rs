//! Scripted stand-ins for ffprobe and ffmpeg

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use webm_converter::app::JobEvent;
use webm_converter::error::ConvertResult;
use webm_converter::ports::{EncoderPort, JobObserver, PassExit, ProbePort};
use webm_converter::{JobId, JobState, MediaInfo, Pass, ProbeError, ProgressReport};

/// Prober returning a fixed result and counting calls
pub struct FixedProbe {
    result: Result<MediaInfo, ProbeError>,
    calls: AtomicUsize,
}

impl FixedProbe {
    pub fn ok(duration_seconds: f64, width: u32, height: u32) -> Self {
        Self {
            result: Ok(MediaInfo {
                duration_seconds,
                width,
                height,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(error: ProbeError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbePort for FixedProbe {
    async fn probe(&self, _path: &Path) -> Result<MediaInfo, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Behaviour of one scripted encoder pass
#[derive(Debug, Clone)]
pub struct Step {
    pub lines: Vec<String>,
    pub code: Option<i32>,
    pub block_until_cancelled: bool,
    /// Fire the job's token, then exit with `code` as an interrupted encoder would
    pub interrupted: bool,
}

impl Step {
    pub fn exit(code: i32) -> Self {
        Self {
            lines: Vec::new(),
            code: Some(code),
            block_until_cancelled: false,
            interrupted: false,
        }
    }

    pub fn interrupted(code: i32) -> Self {
        Self {
            interrupted: true,
            ..Self::exit(code)
        }
    }

    pub fn blocking() -> Self {
        Self {
            lines: Vec::new(),
            code: None,
            block_until_cancelled: true,
            interrupted: false,
        }
    }

    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|line| line.to_string()).collect();
        self
    }
}

/// One recorded encoder invocation
#[derive(Debug, Clone)]
pub struct Call {
    pub pass: Pass,
    pub args: Vec<String>,
    /// Whether the file named by the last argument existed at spawn time
    pub target_existed: bool,
}

/// Encoder that replays scripted steps and records its arguments.
///
/// A successful second pass writes 2048 bytes to the output path.
pub struct ScriptedEncoder {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
    started: mpsc::UnboundedSender<Pass>,
}

impl ScriptedEncoder {
    pub fn new(steps: Vec<Step>) -> (Self, mpsc::UnboundedReceiver<Pass>) {
        let (started, receiver) = mpsc::unbounded_channel();
        let encoder = Self {
            script: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
            started,
        };
        (encoder, receiver)
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EncoderPort for ScriptedEncoder {
    async fn run_pass(
        &self,
        pass: Pass,
        args: &[String],
        cancel: &CancellationToken,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> ConvertResult<PassExit> {
        let target = PathBuf::from(args.last().cloned().unwrap_or_default());
        self.calls.lock().unwrap().push(Call {
            pass,
            args: args.to_vec(),
            target_existed: target.exists(),
        });
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::exit(0));
        let _ = self.started.send(pass);

        for line in &step.lines {
            on_line(line);
        }

        if step.interrupted {
            cancel.cancel();
            return Ok(PassExit::Exited(step.code));
        }

        if step.block_until_cancelled {
            cancel.cancelled().await;
            return Ok(PassExit::Cancelled);
        }

        if pass == Pass::Second && step.code == Some(0) {
            tokio::fs::write(&target, vec![0u8; 2048]).await.unwrap();
        }
        Ok(PassExit::Exited(step.code))
    }
}

/// Observer that keeps everything it is told
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub progress: Vec<ProgressReport>,
    pub states: Vec<JobState>,
}

impl JobObserver for RecordingObserver {
    fn on_progress(&mut self, report: ProgressReport) {
        self.progress.push(report);
    }

    fn on_state_change(&mut self, _job_id: JobId, state: JobState) {
        self.states.push(state);
    }
}

/// Receive events up to and including the job's `Completed` event
pub async fn collect_until_completed(events: &mut mpsc::UnboundedReceiver<JobEvent>) -> Vec<JobEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("job must finish")
            .expect("event stream must stay open");
        let done = matches!(event, JobEvent::Completed { .. });
        seen.push(event);
        if done {
            return seen;
        }
    }
}

pub fn states(events: &[JobEvent]) -> Vec<JobState> {
    events
        .iter()
        .filter_map(|event| match event {
            JobEvent::StateChanged(snapshot) => Some(snapshot.state),
            _ => None,
        })
        .collect()
}

pub fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}
