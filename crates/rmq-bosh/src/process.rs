use std::process::Stdio;
use std::time::Duration;

use rmq_core::truncate_for_display;
use tokio::process::{Child, Command};

const MAX_TEXT_FILE_BUSY_RETRIES: u32 = 5;
const TEXT_FILE_BUSY_ERRNO: i32 = 26;
const FAILURE_SUMMARY_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProcessOutput {
    pub(crate) success: bool,
    pub(crate) status: String,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunError {
    TimedOut { timeout_ms: u64 },
    Io(String),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::TimedOut { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            RunError::Io(message) => f.write_str(message),
        }
    }
}

impl ProcessOutput {
    pub(crate) fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return truncate_for_display(stderr, FAILURE_SUMMARY_CHARS);
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return truncate_for_display(stdout, FAILURE_SUMMARY_CHARS);
        }
        "no error output".to_string()
    }
}

async fn spawn_with_text_file_busy_retry(
    command: &mut Command,
    executable: &str,
) -> Result<Child, RunError> {
    for attempt in 0..=MAX_TEXT_FILE_BUSY_RETRIES {
        match command.spawn() {
            Ok(child) => return Ok(child),
            Err(error) => {
                if error.raw_os_error() == Some(TEXT_FILE_BUSY_ERRNO)
                    && attempt < MAX_TEXT_FILE_BUSY_RETRIES
                {
                    tokio::time::sleep(Duration::from_millis(25)).await;
                    continue;
                }
                return Err(RunError::Io(format!(
                    "failed to spawn '{executable}': {error}"
                )));
            }
        }
    }

    Err(RunError::Io(format!(
        "failed to spawn '{executable}': unknown error"
    )))
}

/// Runs `executable args...` to completion, killing it once `timeout_ms` elapses.
pub(crate) async fn run_process(
    executable: &str,
    args: &[String],
    timeout_ms: u64,
) -> Result<ProcessOutput, RunError> {
    let mut command = Command::new(executable);
    command.kill_on_drop(true);
    command.args(args);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    let child = spawn_with_text_file_busy_retry(&mut command, executable).await?;

    let output = tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output())
        .await
        .map_err(|_| RunError::TimedOut { timeout_ms })?
        .map_err(|error| RunError::Io(format!("'{executable}' process failed: {error}")))?;

    let status = output
        .status
        .code()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "signal".to_string());
    Ok(ProcessOutput {
        success: output.status.success(),
        status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::ProcessOutput;

    fn output(stdout: &str, stderr: &str) -> ProcessOutput {
        ProcessOutput {
            success: false,
            status: "1".to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn unit_failure_summary_prefers_stderr_then_stdout() {
        assert_eq!(output("out", "err").failure_summary(), "err");
        assert_eq!(output("out", "  ").failure_summary(), "out");
        assert_eq!(output("", "").failure_summary(), "no error output");
    }
}
