//! `gateway_call` tool: forwards a call to a tool hosted on the gateway.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::gateway::GatewayClient;

use super::types::required_str;
use super::{Tool, ToolContext};

pub struct GatewayCallTool {
    client: Arc<GatewayClient>,
}

impl GatewayCallTool {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GatewayCallTool {
    fn name(&self) -> &str {
        "gateway_call"
    }

    fn description(&self) -> &str {
        "Call a tool hosted on the tool gateway by name with JSON arguments."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tool_name": {
                    "type": "string",
                    "description": "Name of the gateway tool"
                },
                "arguments": {
                    "type": "object",
                    "description": "Arguments passed to the gateway tool"
                }
            },
            "required": ["tool_name"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let tool_name = required_str(&args, "tool_name")?;
        let arguments = args.get("arguments").cloned().unwrap_or_else(|| json!({}));
        let result = self.client.call_tool(tool_name, arguments).await?;
        Ok(match result {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }
}
