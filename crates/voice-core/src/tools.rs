//! Tool-call side channel between the reasoning backend and the agent.
//!
//! The reasoning backend may invoke a tool mid-conversation. The request
//! carries the [`CallContext`] of the call it was issued on, so a tool
//! resolves call identity at invocation time rather than from state
//! captured when the session was assembled.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::call::CallContext;

/// Description of a tool as exposed to the reasoning backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name used for dispatch.
    pub name: String,
    /// When the backend should use the tool.
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// Result of a tool execution.
///
/// `content` is always a short human-readable string; failures are
/// explanations for the reasoning backend to relay, not error objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// The tool call ID this result corresponds to.
    pub tool_call_id: String,
    /// The result content (will be sent back to the model).
    pub content: String,
    /// Whether the tool execution succeeded.
    pub success: bool,
}

impl ToolResult {
    /// Create a successful tool result.
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            success: true,
        }
    }

    /// Create a failed tool result. The content is passed through verbatim.
    pub fn failure(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            success: false,
        }
    }
}

/// A request to execute a tool.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    /// Unique ID for this tool call.
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: HashMap<String, Value>,
    /// The call this invocation belongs to.
    pub context: CallContext,
}

impl ToolRequest {
    /// Create a request from already-parsed arguments.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: HashMap<String, Value>,
        context: CallContext,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            context,
        }
    }
}

/// Trait for executing tools invoked by the reasoning backend.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool.
    ///
    /// Returns `None` when the call ended before the tool finished; the
    /// result is discarded and must not be delivered to the session.
    async fn execute(&self, request: ToolRequest) -> Option<ToolResult>;

    /// Tools this executor offers, in a stable order.
    fn tool_specs(&self) -> Vec<ToolSpec>;
}
