//! Post-recording shell commands.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::RecorderResult;

/// Run one configured command through `sh -c` and wait for it.
///
/// Returns `None` when the command is blank. The exit status is reported,
/// not interpreted.
pub async fn run_shell_command(command: &str) -> RecorderResult<Option<ExitStatus>> {
    if command.trim().is_empty() {
        debug!("Skipping empty command");
        return Ok(None);
    }

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            exit_code = ?output.status.code(),
            "Command '{}' exited unsuccessfully: {}",
            command,
            stderr.trim()
        );
    }
    Ok(Some(output.status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_and_failure_are_reported() {
        let ok = run_shell_command("true").await.unwrap().unwrap();
        assert!(ok.success());

        let failed = run_shell_command("exit 3").await.unwrap().unwrap();
        assert_eq!(failed.code(), Some(3));
    }

    #[tokio::test]
    async fn test_blank_command_is_skipped() {
        assert!(run_shell_command("  ").await.unwrap().is_none());
    }
}
