//! Step executor.
//!
//! Runs one approved workflow's steps in order against the tool registry,
//! recording per-step outcomes and deriving the workflow's terminal status.

use std::sync::Arc;

use tracing::{info, warn};

use foreman_core::types::{LogLevel, StepStatus, UserId, Workflow, WorkflowStatus};
use foreman_tools::registry::ToolRegistry;

/// Drives one workflow's steps to completion.
///
/// The caller (the approve transition) guarantees the workflow was in
/// `waiting_approval` immediately before invocation; the executor does not
/// re-check status mid-run. Steps within a workflow run strictly
/// sequentially; separate workflows may run concurrently, each with its own
/// `run` call.
pub struct StepExecutor {
    registry: Arc<ToolRegistry>,
}

impl StepExecutor {
    /// Create an executor over a shared tool registry.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Execute every step in order and return the derived terminal status.
    ///
    /// Failure policy: a failing step does **not** abort the remaining
    /// steps; all steps run, and the workflow is `failed` iff any step
    /// failed. Tool errors are converted into the step's `error` field and
    /// never propagate out of the executor.
    pub async fn run(&self, workflow: &mut Workflow, user_id: &UserId) -> WorkflowStatus {
        let total = workflow.steps.len();
        for i in 0..total {
            let tool_name = workflow.steps[i].tool.clone();
            let input = workflow.steps[i].input.clone();

            workflow.steps[i].status = StepStatus::Processing;
            workflow.push_log(
                LogLevel::Info,
                format!("step {}/{total} started: {tool_name}", i + 1),
            );
            info!(workflow = %workflow.id, step = i + 1, tool = %tool_name, "step started");

            let Some(tool) = self.registry.resolve(&tool_name) else {
                Self::fail_step(workflow, i, format!("tool not found: {tool_name}"));
                continue;
            };

            if !self.registry.authorize(user_id, tool.as_ref()) {
                let permission = tool.required_permission().unwrap_or_default();
                Self::fail_step(workflow, i, format!("permission denied: {permission}"));
                continue;
            }

            match tool.invoke(input).await {
                Ok(outcome) if outcome.ok => {
                    workflow.steps[i].status = StepStatus::Completed;
                    workflow.steps[i].result = Some(outcome.result);
                    workflow.push_log(
                        LogLevel::Success,
                        format!("step {}/{total} completed: {tool_name}", i + 1),
                    );
                    info!(workflow = %workflow.id, step = i + 1, "step completed");
                }
                Ok(outcome) => {
                    // Failed outcomes may still carry a payload (e.g.
                    // captured process output); keep it inspectable.
                    if !outcome.result.is_null() {
                        workflow.steps[i].result = Some(outcome.result);
                    }
                    let error = outcome
                        .error
                        .unwrap_or_else(|| "tool reported failure".to_string());
                    Self::fail_step(workflow, i, error);
                }
                Err(e) => Self::fail_step(workflow, i, e.to_string()),
            }
        }

        let status = if workflow
            .steps
            .iter()
            .any(|s| s.status == StepStatus::Failed)
        {
            WorkflowStatus::Failed
        } else {
            WorkflowStatus::Completed
        };

        let level = match status {
            WorkflowStatus::Completed => LogLevel::Success,
            _ => LogLevel::Error,
        };
        workflow.push_log(level, format!("workflow {status}"));
        info!(workflow = %workflow.id, %status, "workflow finished");
        status
    }

    fn fail_step(workflow: &mut Workflow, i: usize, error: String) {
        warn!(workflow = %workflow.id, step = i + 1, %error, "step failed");
        workflow.push_log(
            LogLevel::Error,
            format!("step {} failed: {error}", i + 1),
        );
        workflow.steps[i].status = StepStatus::Failed;
        workflow.steps[i].error = Some(error);
    }
}
