//! Path helpers for input/output naming and tool discovery

use std::path::{Path, PathBuf};

/// Output extension for every conversion
pub const OUTPUT_EXTENSION: &str = "webm";

/// Input path with its extension replaced by `.webm`.
///
/// When the input already is that path, a `_converted` suffix is added to
/// the stem so the output never aliases the source.
pub fn default_output_path(input: &Path) -> PathBuf {
    let candidate = input.with_extension(OUTPUT_EXTENSION);
    if candidate != input {
        return candidate;
    }

    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_converted.{}", stem, OUTPUT_EXTENSION))
}

/// File name shown to the user
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Sink the analysis pass writes to
pub fn null_sink() -> &'static str {
    if cfg!(windows) {
        "NUL"
    } else {
        "/dev/null"
    }
}

/// Resolve an external tool: a copy in `dir` wins, otherwise the bare name
/// is left for `PATH` lookup
pub fn discover_tool(dir: &Path, name: &str) -> PathBuf {
    let file_name = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };

    let local = dir.join(&file_name);
    if local.is_file() {
        local
    } else {
        PathBuf::from(file_name)
    }
}
