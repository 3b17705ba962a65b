use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

/// Exit code reported when the process never produced one (spawn failure,
/// killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// Everything observed from one external invocation.
///
/// Callers must check [`success`](Self::success) before trusting `stdout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
    /// Process exit code, or [`NO_EXIT_CODE`].
    pub exit_code: i32,
}

impl CommandOutput {
    /// A successful invocation with the given stdout.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// A failed invocation with the given stderr and exit code.
    #[must_use]
    pub fn failed(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// Runs an external command given as a full argument vector.
///
/// `args[0]` is the program. Implementations never panic or return an error:
/// every outcome, including "could not start", is a [`CommandOutput`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command and capture both streams.
    async fn run(&self, args: &[String]) -> CommandOutput;
}

/// Runs commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a new process runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> CommandOutput {
        let Some((program, rest)) = args.split_first() else {
            return CommandOutput::failed("empty command line", NO_EXIT_CODE);
        };

        debug!(program = %program, arg_count = rest.len(), "spawning engine process");

        let output = match Command::new(program)
            .args(rest)
            .kill_on_drop(true)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                debug!(program = %program, error = %e, "engine process failed to start");
                return CommandOutput::failed(format!("failed to run {program}: {e}"), NO_EXIT_CODE);
            },
        };

        let exit_code = output.status.code().unwrap_or(NO_EXIT_CODE);
        debug!(program = %program, exit_code, "engine process finished");

        CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    #[tokio::test]
    async fn test_empty_command_line_fails() {
        let output = ProcessRunner::new().run(&[]).await;
        assert!(!output.success);
        assert_eq!(output.exit_code, NO_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported_not_raised() {
        let output = ProcessRunner::new()
            .run(&argv(&["bqgate-definitely-not-installed-binary"]))
            .await;
        assert!(!output.success);
        assert_eq!(output.exit_code, NO_EXIT_CODE);
        assert!(output.stderr.contains("bqgate-definitely-not-installed-binary"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_both_streams_and_exit_code() {
        let output = ProcessRunner::new()
            .run(&argv(&["sh", "-c", "echo out; echo err >&2; exit 3"]))
            .await;
        assert!(!output.success);
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success() {
        let output = ProcessRunner::new().run(&argv(&["sh", "-c", "printf hi"])).await;
        assert!(output.success);
        assert_eq!(output.stdout, "hi");
        assert_eq!(output.exit_code, 0);
    }
}
