//! # Foreman Core
//!
//! Core types, configuration, and command validation for Foreman.
//!
//! This crate provides:
//! - Workflow, step, and log record types shared across the workspace
//! - Configuration loading (JSON5 format) with environment overrides
//! - Denylist-based command validation for the sandboxed terminal tool

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod types;
pub mod validation;

pub use config::{Config, ConfigError, QueueSettings, SandboxSettings};
pub use types::{
    LogEntry, LogLevel, PlannedStep, Step, StepStatus, UserId, Workflow, WorkflowId,
    WorkflowStatus,
};
pub use validation::{ValidationError, validate_command};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::types::*;
    pub use crate::validation::validate_command;
}
