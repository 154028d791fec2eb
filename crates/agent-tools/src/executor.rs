//! ToolExecutor implementation backed by ToolRegistry.
//!
//! Each invocation runs on its own spawned task, off the call's
//! conversation loop, so a slow network tool cannot stall audio. If the
//! call closes first the task is aborted and its result dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};
use voice_core::{ToolExecutor, ToolRequest, ToolResult, ToolSpec};

use crate::{ToolError, ToolRegistry};

/// Default bound on one tool invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(20);

/// Limits applied to every tool invocation.
#[derive(Debug, Clone)]
pub struct ToolPolicy {
    pub timeout: Duration,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

impl ToolPolicy {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct RegistryToolExecutor {
    registry: Arc<ToolRegistry>,
    policy: ToolPolicy,
}

impl RegistryToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self::with_policy(registry, ToolPolicy::default())
    }

    pub fn with_policy(registry: ToolRegistry, policy: ToolPolicy) -> Self {
        Self {
            registry: Arc::new(registry),
            policy,
        }
    }
}

#[async_trait::async_trait]
impl ToolExecutor for RegistryToolExecutor {
    async fn execute(&self, request: ToolRequest) -> Option<ToolResult> {
        let ToolRequest {
            id,
            name,
            arguments,
            context: ctx,
        } = request;

        if ctx.is_closed() {
            debug!("Call {} already closed, not running '{}'", ctx.call_id(), name);
            return None;
        }

        let registry = self.registry.clone();
        let limit = self.policy.timeout;
        let task = {
            let name = name.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { timeout(limit, registry.execute(&name, arguments, ctx)).await })
        };
        let abort = task.abort_handle();

        let joined = tokio::select! {
            biased;
            _ = ctx.closed() => {
                abort.abort();
                debug!("Call {} closed while '{}' was running, result discarded", ctx.call_id(), name);
                return None;
            }
            joined = task => joined,
        };

        if ctx.is_closed() {
            debug!("Call {} closed, dropping result of '{}'", ctx.call_id(), name);
            return None;
        }

        let result = match joined {
            Ok(Ok(Ok(output))) if output.success => ToolResult::success(id, output.content),
            Ok(Ok(Ok(output))) => ToolResult::failure(id, output.content),
            Ok(Ok(Err(error))) => ToolResult::failure(id, error.to_string()),
            Ok(Err(_)) => ToolResult::failure(id, ToolError::Timeout(limit).to_string()),
            Err(error) => {
                warn!("Tool '{}' task failed: {}", name, error);
                ToolResult::failure(id, ToolError::ExecutionFailed(name).to_string())
            }
        };
        Some(result)
    }

    fn tool_specs(&self) -> Vec<ToolSpec> {
        self.registry.tool_specs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Tool, ToolArgs, ToolOutput};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voice_core::CallController;

    struct CountingTool {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counting_tool"
        }

        fn description(&self) -> &str {
            "Counts executions"
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let current = self.count.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ToolOutput::success(format!("count: {}", current)))
        }
    }

    struct SlowTool {
        finished: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow_tool"
        }

        fn description(&self) -> &str {
            "Takes a while"
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(self.delay).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::success("done"))
        }
    }

    fn request(name: &str, controller: &CallController) -> ToolRequest {
        ToolRequest::new("1", name, HashMap::new(), controller.context())
    }

    #[tokio::test]
    async fn test_executes_and_reports_specs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(CountingTool { count: counter.clone() });
        let executor = RegistryToolExecutor::new(registry);
        let controller = CallController::new("job-1");

        let result = executor.execute(request("counting_tool", &controller)).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content, "count: 1");
        assert_eq!(executor.tool_specs()[0].name, "counting_tool");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_a_string_result() {
        let executor = RegistryToolExecutor::new(ToolRegistry::new());
        let controller = CallController::new("job-1");

        let result = executor.execute(request("missing", &controller)).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.content, "Tool not found: missing");
    }

    #[tokio::test]
    async fn test_timeout() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(SlowTool {
            finished: finished.clone(),
            delay: Duration::from_secs(5),
        });
        let policy = ToolPolicy::default().with_timeout(Duration::from_millis(50));
        let executor = RegistryToolExecutor::with_policy(registry, policy);
        let controller = CallController::new("job-1");

        let result = executor.execute(request("slow_tool", &controller)).await.unwrap();
        assert!(!result.success);
        assert!(result.content.starts_with("Tool execution timed out"));
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_result_discarded_when_call_closes() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(SlowTool {
            finished: finished.clone(),
            delay: Duration::from_millis(300),
        });
        let executor = Arc::new(RegistryToolExecutor::new(registry));
        let controller = CallController::new("job-1");

        let pending = {
            let executor = executor.clone();
            let request = request("slow_tool", &controller);
            tokio::spawn(async move { executor.execute(request).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.close();

        assert!(pending.await.unwrap().is_none());
        // The aborted task never completes.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_closed_call_runs_nothing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(CountingTool { count: counter.clone() });
        let executor = RegistryToolExecutor::new(registry);
        let controller = CallController::new("job-1");
        controller.close();

        assert!(executor.execute(request("counting_tool", &controller)).await.is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
