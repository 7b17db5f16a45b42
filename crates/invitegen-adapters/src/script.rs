//! OS script execution with a timeout.
//!
//! Wraps `tokio::process::Command` for the scripting bridges the mail
//! composers drive (`osascript` on macOS).  Output is truncated to
//! [`MAX_OUTPUT_BYTES`] and the child is killed if it outlives the timeout.

use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{AdapterError, Result};

/// Default script timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum captured output in bytes (100 KB), per stream.
const MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Captured result of a finished script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit code, `-1` when terminated by a signal.
    pub exit_code: i32,
    /// Captured stdout (possibly truncated).
    pub stdout: String,
    /// Captured stderr (possibly truncated).
    pub stderr: String,
}

impl ScriptOutput {
    /// Whether the script exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `program` with `args`, waiting at most `timeout_secs`.
///
/// Spawn failures, wait failures and timeouts are errors; a non-zero exit is
/// reported through [`ScriptOutput::exit_code`].
pub async fn run_script(program: &str, args: &[&str], timeout_secs: u64) -> Result<ScriptOutput> {
    debug!(program = program, args = args.len(), timeout_secs, "running script");

    let child = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AdapterError::ExecutionFailed {
            operation: program.to_owned(),
            reason: format!("failed to spawn process: {e}"),
        })?;

    // `wait_with_output` takes ownership, so on timeout the child is dropped
    // and killed via `kill_on_drop(true)`.
    let result =
        tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await;

    match result {
        Ok(Ok(output)) => {
            let exit_code = output.status.code().unwrap_or(-1);
            let (stdout, stdout_truncated) = truncate_output(&output.stdout);
            let (stderr, stderr_truncated) = truncate_output(&output.stderr);

            debug!(
                exit_code,
                stdout_truncated, stderr_truncated, "script completed"
            );

            Ok(ScriptOutput {
                exit_code,
                stdout,
                stderr,
            })
        }
        Ok(Err(e)) => Err(AdapterError::ExecutionFailed {
            operation: program.to_owned(),
            reason: format!("process error: {e}"),
        }),
        Err(_) => {
            warn!(program = program, timeout_secs, "script timed out");
            Err(AdapterError::Timeout {
                seconds: timeout_secs,
                reason: format!("`{program}` exceeded time limit"),
            })
        }
    }
}

/// Truncate raw output to [`MAX_OUTPUT_BYTES`], converting to a lossy UTF-8
/// string.  Returns `(output_string, was_truncated)`.
fn truncate_output(raw: &[u8]) -> (String, bool) {
    if raw.len() <= MAX_OUTPUT_BYTES {
        (String::from_utf8_lossy(raw).into_owned(), false)
    } else {
        let mut s = String::from_utf8_lossy(&raw[..MAX_OUTPUT_BYTES]).into_owned();
        s.push_str("\n... [output truncated at 100 KB]");
        (s, true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_output_short_input_not_truncated() {
        let (s, truncated) = truncate_output(b"hello world");
        assert_eq!(s, "hello world");
        assert!(!truncated);
    }

    #[test]
    fn truncate_output_large_input_is_truncated() {
        let data = vec![b'x'; MAX_OUTPUT_BYTES + 1000];
        let (s, truncated) = truncate_output(&data);
        assert!(truncated);
        assert!(s.contains("[output truncated at 100 KB]"));
        assert!(s.len() <= MAX_OUTPUT_BYTES + 50);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_script_captures_output_and_exit_code() {
        let out = run_script("sh", &["-c", "echo out; echo err >&2; exit 3"], 5)
            .await
            .unwrap();
        assert_eq!(out.exit_code, 3);
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_script_times_out() {
        let err = run_script("sh", &["-c", "sleep 5"], 1).await.unwrap_err();
        assert!(matches!(err, AdapterError::Timeout { seconds: 1, .. }));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let err = run_script("definitely-not-a-real-program-xyz", &[], 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::ExecutionFailed { .. }));
    }
}
