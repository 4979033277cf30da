//! Core types used throughout Foreman.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(pub String);

impl WorkflowId {
    /// Create a workflow ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random workflow ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for WorkflowId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Planned but not yet started.
    Pending,
    /// Tool invocation in flight.
    Processing,
    /// Tool returned a successful outcome.
    Completed,
    /// Tool failed, was denied, or was not found.
    Failed,
}

/// Lifecycle status of a workflow.
///
/// `created → waiting_approval → {processing → completed|failed} | rejected`;
/// rephrase is a self-loop on `waiting_approval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Just created, plan not yet attached.
    Created,
    /// Plan attached, awaiting a human decision.
    WaitingApproval,
    /// Approved; steps are executing.
    Processing,
    /// Every step completed.
    Completed,
    /// At least one step failed.
    Failed,
    /// Rejected by a human before execution.
    Rejected,
}

impl WorkflowStatus {
    /// Whether this status is terminal (no further transitions).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Rejected)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::WaitingApproval => "waiting_approval",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// One planned tool invocation produced by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Tool name to invoke.
    pub tool: String,
    /// Structured input payload for the tool.
    pub input: serde_json::Value,
}

/// One step of a workflow with its own lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Tool name to invoke.
    pub tool: String,
    /// Structured input payload for the tool.
    pub input: serde_json::Value,
    /// Current step status.
    pub status: StepStatus,
    /// Structured result payload, set when the tool resolves.
    pub result: Option<serde_json::Value>,
    /// Error text, set when the step fails.
    pub error: Option<String>,
}

impl Step {
    /// Create a pending step for a tool invocation.
    #[must_use]
    pub fn new(tool: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            tool: tool.into(),
            input,
            status: StepStatus::Pending,
            result: None,
            error: None,
        }
    }
}

impl From<PlannedStep> for Step {
    fn from(planned: PlannedStep) -> Self {
        Self::new(planned.tool, planned.input)
    }
}

/// Severity of a workflow log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Informational transition.
    Info,
    /// A step or the workflow completed successfully.
    Success,
    /// A step or the workflow failed.
    Error,
}

/// One entry in a workflow's append-only log trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Entry severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
}

/// One user-initiated request: an ordered plan of steps plus approval state.
///
/// The `steps` list is fixed once `status` leaves `waiting_approval`; a
/// rephrase while still `waiting_approval` replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier.
    pub id: WorkflowId,
    /// Owner of the workflow.
    pub user_id: UserId,
    /// The free-text prompt the plan was generated from.
    pub prompt: String,
    /// Current lifecycle status.
    pub status: WorkflowStatus,
    /// Ordered plan of steps.
    pub steps: Vec<Step>,
    /// Append-only log trail for the observability collaborator.
    pub logs: Vec<LogEntry>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    /// Create a new workflow in `created` state with no steps attached.
    #[must_use]
    pub fn new(user_id: UserId, prompt: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::generate(),
            user_id,
            prompt: prompt.into(),
            status: WorkflowStatus::Created,
            steps: Vec::new(),
            logs: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append an entry to the workflow's log trail.
    pub fn push_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.logs.push(LogEntry {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        });
    }
}
