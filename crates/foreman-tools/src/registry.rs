//! Tool abstraction, registry, and permission grants.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use foreman_core::types::UserId;

/// Tool invocation errors.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool not found.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Invalid input payload.
    #[error("invalid input: {0}")]
    InvalidParams(String),

    /// Execution failed before an outcome could be produced.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Tool exceeded its deadline.
    #[error("tool timed out")]
    Timeout,
}

/// Outcome of a tool invocation.
///
/// Mirrors the `{ok, result}` / `{ok: false, error}` shape the step executor
/// records on each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Whether the invocation succeeded.
    pub ok: bool,
    /// Structured result payload.
    pub result: serde_json::Value,
    /// Error message if failed.
    pub error: Option<String>,
}

impl ToolOutcome {
    /// Create a successful outcome with a result payload.
    #[must_use]
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            ok: true,
            result,
            error: None,
        }
    }

    /// Create a failed outcome with no result payload.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    /// Create a failed outcome that still carries a result payload,
    /// e.g. captured process output alongside the error.
    #[must_use]
    pub fn failure_with_result(result: serde_json::Value, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result,
            error: Some(error.into()),
        }
    }
}

/// A named, permissioned capability invocable with structured input.
///
/// Tools are stateless across invocations except for long-lived transports
/// they own (an HTTP client, a queue handle), which they own exclusively for
/// their lifetime.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, unique within a registry.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Permission string required to invoke this tool, or `None` for a
    /// public tool callable by any user.
    fn required_permission(&self) -> Option<&str> {
        None
    }

    /// Invoke the tool with a structured input payload.
    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutcome, ToolError>;
}

/// Registry of available tools plus per-user permission grants.
///
/// Constructed once at service start and shared by `Arc`; interior locking
/// keeps reads cheap since grants are rare and staleness is acceptable (a
/// grant made during an in-flight authorization check need not be observed
/// by that check).
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
    permissions: RwLock<HashMap<UserId, HashSet<String>>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            permissions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool under its name.
    ///
    /// Caveat: registering a second tool with the same name silently
    /// replaces the first — last registered wins.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(name, tool);
    }

    /// Resolve a tool by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// List all registered tool names.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Grant a permission to a user. Idempotent.
    pub fn grant(&self, user_id: &UserId, permission: impl Into<String>) {
        self.permissions
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(user_id.clone())
            .or_default()
            .insert(permission.into());
    }

    /// Whether a user may invoke a tool.
    ///
    /// True when the tool requires no permission, otherwise exact membership
    /// of the required permission string in the user's grant set.
    #[must_use]
    pub fn authorize(&self, user_id: &UserId, tool: &dyn Tool) -> bool {
        let Some(required) = tool.required_permission() else {
            return true;
        };
        self.permissions
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(user_id)
            .is_some_and(|granted| granted.contains(required))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
