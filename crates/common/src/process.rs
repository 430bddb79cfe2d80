//! Helpers for invoking the external media toolchain.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    /// Human-readable exit status, e.g. `exit status: 1`.
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// Run `program` to completion, capturing both output streams.
///
/// Only spawn failures are errors; a non-zero exit is reported through
/// [`ToolOutput::success`] so callers can surface stderr verbatim.
pub fn run_tool<I, S>(program: &Path, args: I) -> std::io::Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()?;

    Ok(ToolOutput {
        success: output.status.success(),
        status: output.status.to_string(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Whether `binary` resolves to an executable, either as a path or on `PATH`.
pub fn command_exists(binary: &Path) -> bool {
    if binary.components().count() > 1 {
        return binary.is_file();
    }
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {} >/dev/null 2>&1", binary.display()))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
