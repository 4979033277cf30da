//! Sandboxed terminal tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use foreman_core::validation::validate_command;

use crate::queue::ExecutionQueue;
use crate::registry::{Tool, ToolError, ToolOutcome};
use crate::sandbox::{SandboxError, SandboxOutput, SandboxRunner};

/// Runs arbitrary shell commands inside the sandbox, serialized through the
/// process-wide execution queue.
pub struct TerminalTool {
    runner: SandboxRunner,
    queue: Arc<ExecutionQueue>,
}

impl TerminalTool {
    /// Create a terminal tool backed by a runner and the shared queue.
    #[must_use]
    pub fn new(runner: SandboxRunner, queue: Arc<ExecutionQueue>) -> Self {
        Self { runner, queue }
    }
}

/// Map a finished sandbox run to a tool outcome.
///
/// Policy: **any** stderr output is a failure, even when the command
/// exited 0. Both success and failure
/// carry the full `{stdout, stderr, exitCode}` payload so a human can
/// inspect the raw output either way.
fn outcome_from_run(result: Result<SandboxOutput, SandboxError>) -> ToolOutcome {
    match result {
        Ok(output) => {
            let payload = json!({
                "stdout": output.stdout,
                "stderr": output.stderr,
                "exitCode": output.exit_code,
            });
            if output.stderr.is_empty() {
                ToolOutcome::success(payload)
            } else {
                let error = output.stderr.clone();
                ToolOutcome::failure_with_result(payload, error)
            }
        }
        Err(SandboxError::Timeout { .. }) => {
            ToolOutcome::failure("exec_error: Execution timeout")
        }
        Err(SandboxError::Spawn(e)) => ToolOutcome::failure(format!("exec_error: {e}")),
    }
}

#[async_trait]
impl Tool for TerminalTool {
    fn name(&self) -> &str {
        "terminal"
    }

    fn description(&self) -> &str {
        "Run a shell command in an isolated, resource-capped sandbox"
    }

    fn required_permission(&self) -> Option<&str> {
        Some("terminal:run")
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let cmd = input["cmd"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidParams("missing 'cmd' field".to_string()))?;

        // Fails fast: a rejected command never reaches the queue or the
        // sandbox.
        validate_command(cmd, &self.runner.settings().denylist)
            .map_err(|e| ToolError::InvalidParams(e.to_string()))?;

        info!(cmd, "terminal command queued");
        let result = self.queue.submit(self.runner.run(cmd)).await;
        Ok(outcome_from_run(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_core::config::SandboxSettings;
    use pretty_assertions::assert_eq;

    fn tool() -> TerminalTool {
        TerminalTool::new(
            SandboxRunner::new(SandboxSettings::default()),
            Arc::new(ExecutionQueue::new(1)),
        )
    }

    #[tokio::test]
    async fn test_missing_cmd_field() {
        let result = tool().invoke(json!({"command": "echo hi"})).await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[tokio::test]
    async fn test_denylisted_command_rejected_without_sandbox() {
        // No docker needed: validation fails before the sandbox is touched.
        for cmd in ["rm -rf /", "sudo ls", "shutdown now", "reboot"] {
            let result = tool().invoke(json!({ "cmd": cmd })).await;
            assert!(
                matches!(result, Err(ToolError::InvalidParams(_))),
                "expected {cmd:?} to be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let result = tool().invoke(json!({"cmd": ""})).await;
        assert!(matches!(result, Err(ToolError::InvalidParams(_))));
    }

    #[test]
    fn test_clean_output_is_success() {
        let outcome = outcome_from_run(Ok(SandboxOutput {
            stdout: "hello\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
        }));
        assert!(outcome.ok);
        assert_eq!(outcome.result["stdout"], "hello\n");
        assert_eq!(outcome.result["exitCode"], 0);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_any_stderr_is_failure_even_on_exit_zero() {
        let outcome = outcome_from_run(Ok(SandboxOutput {
            stdout: "partial\n".to_string(),
            stderr: "warning: deprecated\n".to_string(),
            exit_code: 0,
        }));
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("warning: deprecated\n"));
        // The payload is still attached for inspection.
        assert_eq!(outcome.result["stdout"], "partial\n");
        assert_eq!(outcome.result["exitCode"], 0);
    }

    #[test]
    fn test_timeout_maps_to_exec_error() {
        let outcome = outcome_from_run(Err(SandboxError::Timeout { timeout_ms: 10_000 }));
        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("exec_error: Execution timeout"));
    }

    #[test]
    fn test_spawn_failure_maps_to_exec_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "docker not found");
        let outcome = outcome_from_run(Err(SandboxError::Spawn(io)));
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap().starts_with("exec_error: "));
    }
}
