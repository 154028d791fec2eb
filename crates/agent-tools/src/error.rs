//! Error types for tool operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// The executor turns every variant into a plain failure string for the
/// reasoning backend; none of them ends the call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool not found in registry.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Missing required parameter.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// Parameter present but unusable.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The invocation ran past its time limit.
    #[error("Tool execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// General execution error.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}
