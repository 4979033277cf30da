//! # Foreman Tools
//!
//! Tool capability abstraction, registry with permission grants, the
//! process-wide execution queue, and the built-in tools: sandboxed terminal,
//! mail sender, web search, and messaging sender.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod mail;
pub mod messaging;
pub mod queue;
pub mod registry;
pub mod sandbox;
pub mod search;
pub mod terminal;

pub use mail::MailTool;
pub use messaging::MessagingTool;
pub use queue::ExecutionQueue;
pub use registry::{Tool, ToolError, ToolOutcome, ToolRegistry};
pub use sandbox::{SandboxError, SandboxOutput, SandboxRunner};
pub use search::SearchTool;
pub use terminal::TerminalTool;
