//! Error handling module for webmconv

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::ProbeError;
use crate::domain::model::Pass;

/// Main error type for conversion operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// Media probe failed
    #[error("Failed to probe media file: {0}")]
    Probe(#[from] ProbeError),

    /// A precondition on the job's inputs does not hold
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input file vanished between selection and start
    #[error("Input file not found: {}", .path.display())]
    InputMissing { path: PathBuf },

    /// Encoder exited unsuccessfully; `code` is `None` when killed by a signal
    #[error("Encoder pass {pass} exited with {}", exit_code_text(.code))]
    EncoderNonZeroExit { pass: Pass, code: Option<i32> },

    /// Encoder process could not be spawned or read
    #[error("Encoder pass {pass} could not run: {message}")]
    EncoderLaunchFailed { pass: Pass, message: String },

    /// A conversion is already running
    #[error("A conversion is already in progress")]
    Busy,

    /// Filesystem error
    #[error("I/O error on {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    /// The worker running a job ended without producing an outcome
    #[error("Conversion worker ended abnormally: {0}")]
    WorkerAborted(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Result type alias for conversion operations
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;
