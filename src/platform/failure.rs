//! Failure report written when a run aborts

use std::path::Path;

/// Exit status the platform reads as a failed training job
pub const FAILURE_EXIT_CODE: i32 = 255;

const FAILURE_PREFIX: &str = "Exception during training: ";

/// Render `"Exception during training: <message>\n<trace>"`.
///
/// The trace is the error's debug rendering: its cause chain, plus the
/// backtrace when one was captured (`RUST_BACKTRACE=1`).
pub fn format_failure(err: &anyhow::Error) -> String {
    format!("{}{}\n{:?}", FAILURE_PREFIX, err, err)
}

/// Write the report to `path`, creating the output directory if needed
pub fn write_failure(path: &Path, report: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report)
}
