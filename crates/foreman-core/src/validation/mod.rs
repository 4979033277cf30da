//! Command validation for the sandboxed terminal tool.
//!
//! Fails fast before any sandbox resource is used.

use thiserror::Error;

/// Validation error types.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Command is empty or whitespace-only.
    #[error("Command is empty")]
    Empty,

    /// Command contains a denylisted token.
    #[error("Command contains forbidden token: {0}")]
    Forbidden(String),
}

/// Default denylist tokens for destructive commands.
pub const DEFAULT_DENYLIST: [&str; 4] = ["rm", "sudo", "shutdown", "reboot"];

/// Validate a shell command against a denylist before sandboxing.
///
/// The filter is a coarse **substring** match, not a shell parser. It blocks
/// innocent words that happen to contain a token (`"confirm"` contains `rm`)
/// and does not stop obfuscated or chained destructive commands. This is a
/// best-effort filter kept for compatibility; the sandbox itself is the real
/// isolation boundary.
///
/// # Errors
///
/// Returns `ValidationError::Empty` for empty/whitespace commands and
/// `ValidationError::Forbidden` when a denylist token matches.
pub fn validate_command(cmd: &str, denylist: &[String]) -> Result<(), ValidationError> {
    if cmd.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    for token in denylist {
        if !token.is_empty() && cmd.contains(token.as_str()) {
            return Err(ValidationError::Forbidden(token.clone()));
        }
    }

    Ok(())
}
