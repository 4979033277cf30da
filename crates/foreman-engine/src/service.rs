//! Approval-gated workflow state machine.
//!
//! Creation plans the steps and parks the workflow in `waiting_approval`.
//! Only an explicit approve transition starts execution; reject and
//! rephrase are the other legal moves out of the gate. Illegal transitions
//! fail without mutating the record.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use foreman_core::types::{UserId, Workflow, WorkflowStatus};

use crate::executor::StepExecutor;
use crate::planner::{PlanError, Planner};

/// Workflow lifecycle errors.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A transition was attempted from a status that does not allow it.
    #[error("cannot {action} workflow in status {status}")]
    StateConflict {
        /// The attempted transition.
        action: &'static str,
        /// The workflow's current status.
        status: WorkflowStatus,
    },
    /// The planner produced no steps for the prompt.
    #[error("planner produced an empty plan")]
    EmptyPlan,
    /// The planner backend failed.
    #[error(transparent)]
    Planner(#[from] PlanError),
}

/// Creates workflows and drives their approval lifecycle.
pub struct WorkflowService {
    planner: Arc<dyn Planner>,
    executor: StepExecutor,
}

impl WorkflowService {
    /// Create a service over a planner and a step executor.
    #[must_use]
    pub fn new(planner: Arc<dyn Planner>, executor: StepExecutor) -> Self {
        Self { planner, executor }
    }

    /// Plan a workflow from a prompt and park it awaiting approval.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Planner`] if planning fails and
    /// [`WorkflowError::EmptyPlan`] if the plan has no steps; no workflow
    /// record is produced in either case.
    pub async fn create(
        &self,
        user_id: UserId,
        prompt: impl Into<String>,
    ) -> Result<Workflow, WorkflowError> {
        let prompt = prompt.into();
        let planned = self.planner.plan(&prompt).await?;
        if planned.is_empty() {
            return Err(WorkflowError::EmptyPlan);
        }

        let mut workflow = Workflow::new(user_id, prompt);
        workflow.steps = planned.into_iter().map(Into::into).collect();
        workflow.status = WorkflowStatus::WaitingApproval;
        info!(
            workflow = %workflow.id,
            steps = workflow.steps.len(),
            "workflow created, awaiting approval"
        );
        Ok(workflow)
    }

    /// Approve a waiting workflow and execute its steps to a terminal status.
    ///
    /// Steps run under the permissions of the workflow's owner, not of
    /// whoever triggered the approval.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StateConflict`] when the workflow is not in
    /// `waiting_approval`; the record is left untouched.
    pub async fn approve(&self, workflow: &mut Workflow) -> Result<WorkflowStatus, WorkflowError> {
        Self::expect_waiting(workflow, "approve")?;

        workflow.status = WorkflowStatus::Processing;
        info!(workflow = %workflow.id, "workflow approved");
        let owner = workflow.user_id.clone();
        let status = self.executor.run(workflow, &owner).await;
        workflow.status = status;
        Ok(status)
    }

    /// Reject a waiting workflow.
    ///
    /// The planned steps stay attached, untouched and pending, for audit.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StateConflict`] when the workflow is not in
    /// `waiting_approval`.
    pub fn reject(&self, workflow: &mut Workflow) -> Result<(), WorkflowError> {
        Self::expect_waiting(workflow, "reject")?;

        workflow.status = WorkflowStatus::Rejected;
        info!(workflow = %workflow.id, "workflow rejected");
        Ok(())
    }

    /// Replace a waiting workflow's prompt and plan, staying at the gate.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StateConflict`] when the workflow is not in
    /// `waiting_approval`, and [`WorkflowError::EmptyPlan`] if replanning
    /// yields no steps; the record is unchanged in both cases.
    pub async fn rephrase(
        &self,
        workflow: &mut Workflow,
        prompt: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        Self::expect_waiting(workflow, "rephrase")?;

        let prompt = prompt.into();
        let planned = self.planner.plan(&prompt).await?;
        if planned.is_empty() {
            return Err(WorkflowError::EmptyPlan);
        }

        workflow.prompt = prompt;
        workflow.steps = planned.into_iter().map(Into::into).collect();
        info!(
            workflow = %workflow.id,
            steps = workflow.steps.len(),
            "workflow rephrased, awaiting approval"
        );
        Ok(())
    }

    fn expect_waiting(workflow: &Workflow, action: &'static str) -> Result<(), WorkflowError> {
        if workflow.status == WorkflowStatus::WaitingApproval {
            Ok(())
        } else {
            Err(WorkflowError::StateConflict {
                action,
                status: workflow.status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::StaticPlanner;
    use async_trait::async_trait;
    use foreman_core::types::{PlannedStep, StepStatus};
    use foreman_tools::registry::{Tool, ToolError, ToolOutcome, ToolRegistry};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingTool {
        calls: Arc<AtomicUsize>,
        outcome: ToolOutcome,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "send_email"
        }

        fn description(&self) -> &str {
            "recording test tool"
        }

        async fn invoke(&self, _input: serde_json::Value) -> Result<ToolOutcome, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome.clone())
        }
    }

    fn email_plan() -> Vec<PlannedStep> {
        vec![PlannedStep {
            tool: "send_email".to_string(),
            input: json!({"to": "team@example.com", "subject": "standup"}),
        }]
    }

    fn service_with(
        planner: StaticPlanner,
        outcome: ToolOutcome,
    ) -> (WorkflowService, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(RecordingTool {
            calls: Arc::clone(&calls),
            outcome,
        }));
        let service = WorkflowService::new(
            Arc::new(planner),
            StepExecutor::new(registry),
        );
        (service, calls)
    }

    #[tokio::test]
    async fn test_create_parks_at_waiting_approval() {
        let (service, calls) = service_with(
            StaticPlanner::new(email_plan()),
            ToolOutcome::success(json!({})),
        );

        let workflow = service
            .create(UserId::new("u1"), "email the team")
            .await
            .unwrap();

        assert_eq!(workflow.status, WorkflowStatus::WaitingApproval);
        assert_eq!(workflow.steps.len(), 1);
        assert_eq!(workflow.steps[0].status, StepStatus::Pending);
        assert_eq!(workflow.prompt, "email the team");
        // Nothing executes at creation time.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_plan_rejected_at_creation() {
        let (service, _) = service_with(StaticPlanner::empty(), ToolOutcome::success(json!({})));

        let result = service.create(UserId::new("u1"), "do nothing").await;
        assert!(matches!(result, Err(WorkflowError::EmptyPlan)));
    }

    #[tokio::test]
    async fn test_approve_runs_steps_to_completion() {
        let (service, calls) = service_with(
            StaticPlanner::new(email_plan()),
            ToolOutcome::success(json!({"sent": true})),
        );

        let mut workflow = service
            .create(UserId::new("u1"), "email the team")
            .await
            .unwrap();
        let status = service.approve(&mut workflow).await.unwrap();

        assert_eq!(status, WorkflowStatus::Completed);
        assert_eq!(workflow.status, WorkflowStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(workflow.steps[0].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_approve_surfaces_step_failure() {
        let (service, _) = service_with(
            StaticPlanner::new(email_plan()),
            ToolOutcome::failure("relay unavailable"),
        );

        let mut workflow = service
            .create(UserId::new("u1"), "email the team")
            .await
            .unwrap();
        let status = service.approve(&mut workflow).await.unwrap();

        assert_eq!(status, WorkflowStatus::Failed);
        assert_eq!(
            workflow.steps[0].error.as_deref(),
            Some("relay unavailable")
        );
    }

    #[tokio::test]
    async fn test_reject_keeps_steps_pending_and_tools_untouched() {
        let (service, calls) = service_with(
            StaticPlanner::new(email_plan()),
            ToolOutcome::success(json!({})),
        );

        let mut workflow = service
            .create(UserId::new("u1"), "email the team")
            .await
            .unwrap();
        service.reject(&mut workflow).unwrap();

        assert_eq!(workflow.status, WorkflowStatus::Rejected);
        assert_eq!(workflow.steps[0].status, StepStatus::Pending);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_illegal_transitions_leave_record_unchanged() {
        let (service, _) = service_with(
            StaticPlanner::new(email_plan()),
            ToolOutcome::success(json!({})),
        );

        let mut workflow = service
            .create(UserId::new("u1"), "email the team")
            .await
            .unwrap();
        service.reject(&mut workflow).unwrap();
        let snapshot = workflow.clone();

        // Every transition out of a terminal status must be refused.
        let err = service.approve(&mut workflow).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::StateConflict {
                action: "approve",
                status: WorkflowStatus::Rejected,
            }
        ));
        assert!(service.reject(&mut workflow).is_err());
        assert!(service.rephrase(&mut workflow, "try again").await.is_err());
        assert_eq!(workflow, snapshot);
    }

    #[tokio::test]
    async fn test_rephrase_replaces_plan_and_stays_waiting() {
        let (service, _) = service_with(
            StaticPlanner::new(vec![
                PlannedStep {
                    tool: "send_email".to_string(),
                    input: json!({"to": "a@example.com"}),
                },
                PlannedStep {
                    tool: "send_email".to_string(),
                    input: json!({"to": "b@example.com"}),
                },
            ]),
            ToolOutcome::success(json!({})),
        );

        let mut workflow = service
            .create(UserId::new("u1"), "email a and b")
            .await
            .unwrap();
        service
            .rephrase(&mut workflow, "email a and b separately")
            .await
            .unwrap();

        assert_eq!(workflow.status, WorkflowStatus::WaitingApproval);
        assert_eq!(workflow.prompt, "email a and b separately");
        assert_eq!(workflow.steps.len(), 2);
        assert!(workflow.steps.iter().all(|s| s.status == StepStatus::Pending));
    }

    #[tokio::test]
    async fn test_rephrase_to_empty_plan_is_refused_without_mutation() {
        let (full, _) = service_with(
            StaticPlanner::new(email_plan()),
            ToolOutcome::success(json!({})),
        );
        let mut workflow = full
            .create(UserId::new("u1"), "email the team")
            .await
            .unwrap();
        let snapshot = workflow.clone();

        let (empty, _) = service_with(StaticPlanner::empty(), ToolOutcome::success(json!({})));
        let result = empty.rephrase(&mut workflow, "do nothing").await;

        assert!(matches!(result, Err(WorkflowError::EmptyPlan)));
        assert_eq!(workflow, snapshot);
    }
}
