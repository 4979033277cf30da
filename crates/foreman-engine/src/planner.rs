//! Planner boundary.
//!
//! The planning component that turns a free-text prompt into an ordered
//! list of steps lives outside this core; it is consumed behind this trait
//! as an opaque list-producing function.

use async_trait::async_trait;
use thiserror::Error;

use foreman_core::types::PlannedStep;

/// Planner errors.
#[derive(Error, Debug)]
pub enum PlanError {
    /// The planner backend failed to produce a plan.
    #[error("planner failed: {0}")]
    Backend(String),
}

/// External planning collaborator.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce an ordered plan of tool invocations for a prompt.
    ///
    /// May return an empty plan; the workflow service treats that as a
    /// creation-time failure.
    ///
    /// # Errors
    ///
    /// Returns `PlanError` when the backend fails.
    async fn plan(&self, prompt: &str) -> Result<Vec<PlannedStep>, PlanError>;
}

/// Planner returning a fixed list of steps regardless of prompt.
///
/// Useful for tests and demos.
pub struct StaticPlanner {
    steps: Vec<PlannedStep>,
}

impl StaticPlanner {
    /// Create a planner that always returns the given steps.
    #[must_use]
    pub fn new(steps: Vec<PlannedStep>) -> Self {
        Self { steps }
    }

    /// Create a planner that always returns an empty plan.
    #[must_use]
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }
}

#[async_trait]
impl Planner for StaticPlanner {
    async fn plan(&self, _prompt: &str) -> Result<Vec<PlannedStep>, PlanError> {
        Ok(self.steps.clone())
    }
}
