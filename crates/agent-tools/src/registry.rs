//! Tool registry for managing and executing tools.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};
use voice_core::{CallContext, ToolSpec};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Registry for managing tools.
///
/// Tools keep their registration order, so the tool list offered to the
/// reasoning backend is stable from call to call.
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        info!("Registering tool: {}", name);
        self.tools.insert(name, Arc::new(tool));
    }

    /// Describe every tool for the reasoning backend.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Execute a tool by name with the given parameters.
    pub async fn execute(
        &self,
        name: &str,
        params: HashMap<String, Value>,
        call: CallContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!("Executing tool '{}' with {} params", name, params.len());

        let result = tool.execute(ToolArgs::new(params, call)).await?;

        debug!(
            "Tool '{}' completed: success={}, content_len={}",
            name,
            result.success,
            result.content.len()
        );

        Ok(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use voice_core::CallController;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let message = args.get_string("message")?;
            Ok(ToolOutput::success(message))
        }
    }

    struct RoomTool;

    #[async_trait]
    impl Tool for RoomTool {
        fn name(&self) -> &str {
            "room"
        }

        fn description(&self) -> &str {
            "Reports the current room"
        }

        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::success(
                args.call.room_name().unwrap_or_else(|| "none".to_string()),
            ))
        }
    }

    #[tokio::test]
    async fn test_registry_basic() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(RoomTool);

        let specs = registry.tool_specs();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "room"]);
        assert_eq!(specs[1].description, "Reports the current room");
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let controller = CallController::new("job-1");
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let mut params = HashMap::new();
        params.insert("message".to_string(), Value::from("world"));
        let result = registry
            .execute("echo", params, controller.context())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content, "world");
    }

    #[tokio::test]
    async fn test_room_read_at_execution_time() {
        let controller = CallController::new("job-1");
        let ctx = controller.context();
        let mut registry = ToolRegistry::new();
        registry.register(RoomTool);

        let before = registry.execute("room", HashMap::new(), ctx.clone()).await.unwrap();
        assert_eq!(before.content, "none");

        controller.set_room_name("room-42");
        let after = registry.execute("room", HashMap::new(), ctx).await.unwrap();
        assert_eq!(after.content, "room-42");
    }

    #[tokio::test]
    async fn test_registry_not_found() {
        let controller = CallController::new("job-1");
        let registry = ToolRegistry::new();
        let result = registry
            .execute("nonexistent", HashMap::new(), controller.context())
            .await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }
}
