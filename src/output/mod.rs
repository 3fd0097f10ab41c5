//! Rendering of job events and file selections for the terminal

use std::io::{self, Write};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::app::conversion_controller::JobEvent;
use crate::domain::model::{FileSelection, JobOutcome};
use crate::utils::time::format_clock;

/// Sink for everything the shell shows to the user
pub trait EventRenderer: Send {
    fn render_event(&mut self, event: &JobEvent) -> io::Result<()>;
    fn render_selection(&mut self, selection: &FileSelection) -> io::Result<()>;
}

/// Pick the renderer for the `--json` flag, writing to stdout
pub fn stdout_renderer(json: bool) -> Box<dyn EventRenderer> {
    if json {
        Box::new(JsonRenderer::new(io::stdout()))
    } else {
        Box::new(ConsoleRenderer::new(io::stdout()))
    }
}

/// Human-readable lines; progress rewrites a single line in place
pub struct ConsoleRenderer<W> {
    out: W,
    progress_open: bool,
}

impl<W: Write + Send> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            progress_open: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn close_progress(&mut self) -> io::Result<()> {
        if self.progress_open {
            self.progress_open = false;
            writeln!(self.out)?;
        }
        Ok(())
    }
}

impl<W: Write + Send> EventRenderer for ConsoleRenderer<W> {
    fn render_event(&mut self, event: &JobEvent) -> io::Result<()> {
        match event {
            JobEvent::Progress(report) => {
                write!(
                    self.out,
                    "\rPass {}/2: {:>3}% [{}]",
                    report.pass,
                    report.percent,
                    format_clock(report.elapsed_time_seconds)
                )?;
                self.progress_open = true;
            }
            JobEvent::StateChanged(snapshot) => {
                // Terminal states are reported by the completion message
                if !snapshot.state.is_terminal() {
                    self.close_progress()?;
                    writeln!(self.out, "Job {}: {}", snapshot.id, snapshot.state)?;
                }
            }
            JobEvent::Completed { outcome, .. } => {
                self.close_progress()?;
                writeln!(self.out, "{}", outcome.message())?;
            }
        }
        self.out.flush()
    }

    fn render_selection(&mut self, selection: &FileSelection) -> io::Result<()> {
        writeln!(self.out, "File:     {}", selection.display_name)?;
        writeln!(
            self.out,
            "Duration: {} ({:.3}s)",
            format_clock(selection.duration_seconds),
            selection.duration_seconds
        )?;
        writeln!(self.out, "Size:     {}x{}", selection.width, selection.height)?;
        writeln!(self.out, "Output:   {}", selection.suggested_output.display())?;
        self.out.flush()
    }
}

/// One JSON object per line, each stamped with an RFC 3339 time
pub struct JsonRenderer<W> {
    out: W,
}

impl<W: Write + Send> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, mut record: Value) -> io::Result<()> {
        if let Value::Object(map) = &mut record {
            map.insert(
                "timestamp".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl<W: Write + Send> EventRenderer for JsonRenderer<W> {
    fn render_event(&mut self, event: &JobEvent) -> io::Result<()> {
        let record = match event {
            JobEvent::Progress(report) => json!({
                "event": "progress",
                "job_id": report.job_id,
                "pass": report.pass,
                "percent": report.percent,
                "elapsed_time_seconds": report.elapsed_time_seconds,
            }),
            JobEvent::StateChanged(snapshot) => json!({
                "event": "state",
                "job_id": snapshot.id,
                "state": snapshot.state,
            }),
            JobEvent::Completed { job_id, outcome } => {
                let mut record = json!({
                    "event": "completed",
                    "job_id": job_id,
                    "success": outcome.is_success(),
                    "message": outcome.message(),
                });
                if let JobOutcome::Completed { output, size_bytes } = outcome {
                    record["output"] = json!(output);
                    record["size_bytes"] = json!(size_bytes);
                }
                record
            }
        };
        self.emit(record)
    }

    fn render_selection(&mut self, selection: &FileSelection) -> io::Result<()> {
        let record = serde_json::to_value(selection)?;
        self.emit(record)
    }
}
