//! Sandboxed command execution.
//!
//! Each run launches one disposable, network-disabled, resource-capped
//! container (docker CLI) that is discarded afterwards. A wall-clock
//! deadline races the process; on expiry the process is killed with no
//! grace period, so a call can never hang past its deadline.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use foreman_core::config::SandboxSettings;

/// Sandbox errors.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Failed to spawn the container process.
    #[error("failed to spawn sandbox: {0}")]
    Spawn(#[from] std::io::Error),

    /// The run exceeded its wall-clock deadline and was killed.
    #[error("execution timed out after {timeout_ms} ms")]
    Timeout {
        /// The configured deadline in milliseconds.
        timeout_ms: u64,
    },
}

/// Captured output of one sandboxed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit code (-1 if terminated by signal).
    pub exit_code: i32,
}

/// Runs shell commands inside disposable containers.
///
/// Stateless across runs; nothing persists between calls.
pub struct SandboxRunner {
    settings: SandboxSettings,
}

impl SandboxRunner {
    /// Create a runner with the given settings.
    #[must_use]
    pub fn new(settings: SandboxSettings) -> Self {
        Self { settings }
    }

    /// The settings this runner was configured with.
    #[must_use]
    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    /// Run one command in a fresh container and capture its output.
    ///
    /// The container has no network access, a memory ceiling, a CPU-share
    /// ceiling, and a filesystem that is discarded after the run (`--rm`).
    ///
    /// # Errors
    ///
    /// Returns `SandboxError::Spawn` if the container process cannot be
    /// started and `SandboxError::Timeout` if the deadline fires first.
    pub async fn run(&self, cmd: &str) -> Result<SandboxOutput, SandboxError> {
        let name = format!("foreman-sandbox-{}", uuid::Uuid::new_v4());
        let timeout = Duration::from_millis(self.settings.timeout_ms);

        let mut child = Command::new("docker")
            .args([
                "run",
                "--rm",
                "--name",
                &name,
                "--network",
                "none",
                "--memory",
                &format!("{}m", self.settings.memory_limit_mb),
                "--cpus",
                &self.settings.cpu_quota.to_string(),
                &self.settings.image,
                "sh",
                "-c",
                cmd,
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        debug!(container = %name, timeout_ms = self.settings.timeout_ms, "sandbox run started");

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let result = SandboxOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code().unwrap_or(-1),
                };
                debug!(container = %name, exit_code = result.exit_code, "sandbox run finished");
                Ok(result)
            }
            Ok(Err(e)) => Err(SandboxError::Spawn(e)),
            Err(_) => {
                warn!(
                    container = %name,
                    timeout_ms = self.settings.timeout_ms,
                    "sandbox run exceeded deadline, killing container"
                );
                // The child handle was consumed by wait_with_output and the
                // docker client is killed via kill_on_drop, but killing the
                // client does not reliably stop the container itself.
                // Force-remove it so nothing outlives the call.
                remove_container(&name).await;
                Err(SandboxError::Timeout {
                    timeout_ms: self.settings.timeout_ms,
                })
            }
        }
    }
}

/// Best-effort removal of a container left behind by a timed-out run.
async fn remove_container(name: &str) {
    let result = Command::new("docker")
        .args(["rm", "-f", name])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        warn!(container = %name, error = %e, "failed to remove timed-out container");
    }
}

/// Check whether the docker CLI is available on this host.
#[must_use]
pub async fn is_sandbox_available() -> bool {
    Command::new("docker")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|s| s.success())
}
