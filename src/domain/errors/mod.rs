// Domain errors - Probe failure taxonomy

use std::fmt;

/// Category of a probe failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// Probe output missing, unparseable, or the probe exited nonzero
    MalformedOutput,
    /// No video stream in the probed file
    NoVideoStream,
    /// The probe tool could not be started
    ProcessLaunchFailed,
}

/// Failure to obtain `MediaInfo` for a file
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeError {
    pub kind: ProbeErrorKind,
    pub detail: String,
}

impl ProbeError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: ProbeErrorKind::MalformedOutput,
            detail: detail.into(),
        }
    }

    pub fn no_video_stream(detail: impl Into<String>) -> Self {
        Self {
            kind: ProbeErrorKind::NoVideoStream,
            detail: detail.into(),
        }
    }

    pub fn launch_failed(detail: impl Into<String>) -> Self {
        Self {
            kind: ProbeErrorKind::ProcessLaunchFailed,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeErrorKind::MalformedOutput => write!(f, "malformed probe output"),
            ProbeErrorKind::NoVideoStream => write!(f, "no video stream"),
            ProbeErrorKind::ProcessLaunchFailed => write!(f, "probe could not be started"),
        }
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for ProbeError {}
