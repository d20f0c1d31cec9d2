//! Gateway client for OAuth-protected tool providers.
//!
//! The gateway speaks JSON-RPC 2.0 over HTTP. Tool calls look like:
//!
//! ```json
//! {"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"...","arguments":{...}}}
//! ```
//!
//! and are answered with either a `result` or an `error` member. Every
//! request carries a bearer token from the shared [`TokenCache`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::auth::{ClientCredentials, TokenCache};
use crate::config::GatewayConfig;
use crate::error::{Result, SwitchboardError};
use crate::utils::string::preview;

// ============================================================================
// JSON-RPC envelope
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: ToolCallParams<'a>,
}

#[derive(Debug, Serialize)]
struct ToolCallParams<'a> {
    name: &'a str,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Render a JSON-RPC error member, preferring its `message`.
fn describe_rpc_error(error: &Value) -> String {
    match (error.get("code"), error.get("message").and_then(Value::as_str)) {
        (Some(code), Some(message)) => format!("{} (code {})", message, code),
        (None, Some(message)) => message.to_string(),
        _ => error.to_string(),
    }
}

// ============================================================================
// Gateway client
// ============================================================================

/// JSON-RPC client for the tool gateway.
pub struct GatewayClient {
    client: Client,
    url: String,
    credentials: ClientCredentials,
    tokens: Arc<TokenCache>,
    next_id: AtomicU64,
}

impl GatewayClient {
    pub fn new(
        client: Client,
        url: &str,
        credentials: ClientCredentials,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            client,
            url: url.to_string(),
            credentials,
            tokens,
            next_id: AtomicU64::new(1),
        }
    }

    /// Build from the `gateway` config section, sharing `tokens`.
    pub fn from_config(config: &GatewayConfig, tokens: Arc<TokenCache>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::new(client, &config.url, config.credentials(), tokens))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call `tool_name` on the gateway and return its `result` member
    /// (`null` when absent).
    ///
    /// # Errors
    /// - [`SwitchboardError::Auth`] when no token can be obtained
    /// - [`SwitchboardError::Tool`] for non-2xx answers and JSON-RPC errors
    /// - [`SwitchboardError::Http`] for transport failures
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        let token = self.tokens.get_token(&self.credentials).await?;

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "tools/call",
            params: ToolCallParams {
                name: tool_name,
                arguments,
            },
        };

        info!(tool = %tool_name, gateway = %self.url, "Calling gateway tool");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Tool(format!(
                "gateway returned {}: {}",
                status,
                preview(&body, 200)
            )));
        }

        let body: JsonRpcResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(SwitchboardError::Tool(format!(
                "Gateway error: {}",
                describe_rpc_error(&error)
            )));
        }

        let result = body.result.unwrap_or(Value::Null);
        debug!(tool = %tool_name, result = %preview(&result.to_string(), 120), "Gateway tool returned");
        Ok(result)
    }
}
