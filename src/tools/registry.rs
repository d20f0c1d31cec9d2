//! Tool registry for Switchboard
//!
//! Holds the tools offered to the model, exposes their definitions and runs
//! them with timing logs.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Result;
use crate::providers::ToolDefinition;

use super::{Tool, ToolContext};

/// A registry of model-callable tools.
///
/// # Example
///
/// ```rust
/// use switchboard::tools::{RetrieveMemoriesTool, ToolRegistry};
/// use switchboard::memory::LocalMemoryStore;
/// use std::sync::Arc;
///
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(RetrieveMemoriesTool::new(
///     Arc::new(LocalMemoryStore::ephemeral()),
///     5,
/// )));
/// assert!(registry.has("retrieve_memories"));
/// assert_eq!(registry.definitions().len(), 1);
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        info!(tool = %name, "Registering tool");
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Execute a tool by name.
    ///
    /// An unknown tool name is answered with error text rather than an
    /// `Err`, so the model can correct itself.
    pub async fn execute_with_context(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolContext,
    ) -> Result<String> {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Model requested unknown tool");
            return Ok(format!("Error: Tool not found: {}", name));
        };

        let start = Instant::now();
        match tool.execute(args, ctx).await {
            Ok(output) => {
                info!(
                    tool = name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool executed successfully"
                );
                Ok(output)
            }
            Err(e) => {
                error!(
                    tool = name,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool execution failed"
                );
                Err(e)
            }
        }
    }

    /// Definitions for every tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.parameters()))
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Sorted names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwitchboardError;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the message"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"message": {"type": "string"}}})
        }
        async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String> {
            Ok(format!(
                "{}@{}",
                args["message"].as_str().unwrap_or_default(),
                ctx.actor_id.as_deref().unwrap_or("-")
            ))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "fail"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
            Err(SwitchboardError::Tool("nope".into()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool));
        registry.register(Box::new(EchoTool));
        registry
    }

    #[tokio::test]
    async fn test_execute_passes_context() {
        let ctx = ToolContext::new().with_conversation("u1", "s1");
        let out = registry()
            .execute_with_context("echo", json!({"message": "hi"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, "hi@u1");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text() {
        let out = registry()
            .execute_with_context("missing", json!({}), &ToolContext::new())
            .await
            .unwrap();
        assert_eq!(out, "Error: Tool not found: missing");
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let err = registry()
            .execute_with_context("fail", json!({}), &ToolContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::Tool(_)));
    }

    #[test]
    fn test_definitions_sorted() {
        let registry = registry();
        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "fail"]);
        assert_eq!(registry.names(), vec!["echo", "fail"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("echo").is_some());
    }
}
