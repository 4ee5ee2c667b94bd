use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::error::{CollectError, Result};

/// Hard ceiling on any external tool invocation, so a wedged tool cannot
/// stall the sampling cycle indefinitely.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// First stderr line, trimmed, for compact error messages.
    pub fn stderr_brief(&self) -> String {
        self.stderr.lines().next().unwrap_or("").trim().to_string()
    }
}

/// Runs `tool` with `args` and captures both output streams. The child is
/// killed if it outlives [`TOOL_TIMEOUT`] or the future is dropped.
pub async fn run_tool(tool: &'static str, args: &[&str]) -> Result<ToolOutput> {
    let child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CollectError::Spawn { tool, source })?;

    let output = tokio::time::timeout(TOOL_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| CollectError::Timeout {
            tool,
            timeout_secs: TOOL_TIMEOUT.as_secs(),
        })?
        .map_err(|source| CollectError::Spawn { tool, source })?;

    Ok(ToolOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
