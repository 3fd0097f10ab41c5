//! Per-pass progress tracking from encoder diagnostic lines

use crate::domain::model::{JobId, Pass, ProgressReport};
use crate::domain::rules::progress_percent;
use crate::utils::time::parse_encoder_time;

/// Turns encoder lines into progress reports for a single pass.
///
/// Percent never decreases within a pass; a new tracker starts at 0.
#[derive(Debug, Clone)]
pub struct PassProgress {
    job_id: JobId,
    pass: Pass,
    duration_seconds: f64,
    last_percent: u8,
}

impl PassProgress {
    pub fn new(job_id: JobId, pass: Pass, duration_seconds: f64) -> Self {
        Self {
            job_id,
            pass,
            duration_seconds,
            last_percent: 0,
        }
    }

    /// Report for a line carrying a timestamp, `None` for any other line
    pub fn observe(&mut self, line: &str) -> Option<ProgressReport> {
        let elapsed = parse_encoder_time(line)?;
        let percent = progress_percent(elapsed, self.duration_seconds).max(self.last_percent);
        self.last_percent = percent;

        Some(ProgressReport {
            job_id: self.job_id,
            pass: self.pass,
            percent,
            elapsed_time_seconds: elapsed,
        })
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }
}
