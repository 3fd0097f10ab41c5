//! Encoder timestamp parsing and formatting

use once_cell::sync::Lazy;
use regex::Regex;

/// `time=HH:MM:SS.fraction` as printed in encoder status lines
static ENCODER_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"time=\s*(\d+):(\d+):(\d+(?:\.\d+)?)").expect("encoder time pattern is valid")
});

/// Seconds from clock components
pub fn clock_to_seconds(hours: f64, minutes: f64, seconds: f64) -> f64 {
    hours * 3600.0 + minutes * 60.0 + seconds
}

/// Elapsed seconds of the first `time=` stamp in an encoder line
pub fn parse_encoder_time(line: &str) -> Option<f64> {
    let captures = ENCODER_TIME.captures(line)?;
    let hours: f64 = captures.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = captures.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = captures.get(3)?.as_str().parse().ok()?;
    Some(clock_to_seconds(hours, minutes, seconds))
}

/// Format seconds as HH:MM:SS.ms
pub fn format_clock(total_seconds: f64) -> String {
    let total_millis = (total_seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let seconds = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
