//! `invoke_agent` tool: hands a prompt to a registered sub-agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agents::AgentRouter;
use crate::error::Result;

use super::types::required_str;
use super::{Tool, ToolContext};

/// Tool that routes a prompt to a named agent through [`AgentRouter`].
///
/// Router failures are rendered as `Error (<kind>): <message>` text, so the
/// tool itself only fails on malformed arguments.
pub struct InvokeAgentTool {
    router: Arc<AgentRouter>,
    description: String,
}

impl InvokeAgentTool {
    pub fn new(router: Arc<AgentRouter>) -> Self {
        let description = describe_agents(&router);
        Self {
            router,
            description,
        }
    }
}

fn describe_agents(router: &AgentRouter) -> String {
    let mut description = String::from(
        "Invoke a specialised agent with a prompt and return its answer. Available agents:",
    );
    if router.registry().is_empty() {
        description.push_str(" none");
    }
    for target in router.registry().iter() {
        match &target.description {
            Some(about) => description.push_str(&format!("\n- {}: {}", target.name, about)),
            None => description.push_str(&format!("\n- {}", target.name)),
        }
    }
    description
}

#[async_trait]
impl Tool for InvokeAgentTool {
    fn name(&self) -> &str {
        "invoke_agent"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "agent_name": {
                    "type": "string",
                    "enum": self.router.registry().names(),
                    "description": "Name of the agent to invoke"
                },
                "prompt": {
                    "type": "string",
                    "description": "The prompt to send to the agent"
                }
            },
            "required": ["agent_name", "prompt"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let agent_name = required_str(&args, "agent_name")?;
        let prompt = required_str(&args, "prompt")?;
        Ok(self.router.invoke(agent_name, prompt).await.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentRegistry, AgentTarget, AgentTransport, InvocationRequest};
    use crate::error::SwitchboardError;
    use crate::normalize::RawResponse;

    struct EchoTransport;

    #[async_trait]
    impl AgentTransport for EchoTransport {
        async fn invoke(
            &self,
            target: &AgentTarget,
            request: &InvocationRequest,
        ) -> Result<RawResponse> {
            if target.name == "broken" {
                return Err(SwitchboardError::RemoteInvocation("503 Service Unavailable".into()));
            }
            Ok(RawResponse::json(&json!({
                "result": {"content": [{"text": format!("{} says {}", target.name, request.prompt)}]}
            })))
        }
    }

    fn tool() -> InvokeAgentTool {
        let registry = AgentRegistry::new(vec![
            AgentTarget::new("calculator", "calc-endpoint").with_description("Does arithmetic"),
            AgentTarget::new("broken", "broken-endpoint"),
        ]);
        InvokeAgentTool::new(Arc::new(AgentRouter::new(registry, Arc::new(EchoTransport))))
    }

    #[test]
    fn test_description_lists_agents() {
        let tool = tool();
        assert!(tool.description().contains("- calculator: Does arithmetic"));
        assert!(tool.description().contains("- broken"));
        let params = tool.parameters();
        assert_eq!(params["required"], json!(["agent_name", "prompt"]));
        assert_eq!(params["properties"]["agent_name"]["enum"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invokes_agent() {
        let out = tool()
            .execute(
                json!({"agent_name": "calculator", "prompt": "15*23"}),
                &ToolContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(out, "calculator says 15*23");
    }

    #[tokio::test]
    async fn test_errors_are_text() {
        let tool = tool();
        let out = tool
            .execute(json!({"agent_name": "weather", "prompt": "hi"}), &ToolContext::new())
            .await
            .unwrap();
        assert!(out.starts_with("Error (UnknownAgent): "));

        let out = tool
            .execute(json!({"agent_name": "broken", "prompt": "hi"}), &ToolContext::new())
            .await
            .unwrap();
        assert!(out.starts_with("Error (RemoteInvocationError): "));
        assert!(out.contains("503"));
    }

    #[tokio::test]
    async fn test_missing_prompt() {
        let err = tool()
            .execute(json!({"agent_name": "calculator"}), &ToolContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }
}
