//! # Foreman Engine
//!
//! Drives approved workflows: the planner boundary, the per-step executor,
//! and the approval/rejection/rephrase state machine.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod executor;
pub mod planner;
pub mod service;

pub use executor::StepExecutor;
pub use planner::{PlanError, Planner, StaticPlanner};
pub use service::{WorkflowError, WorkflowService};
