//! `gateway-call` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use switchboard::auth::TokenCache;
use switchboard::config::Config;
use switchboard::gateway::GatewayClient;

/// Call `tool` on the configured gateway and print the result.
pub(crate) async fn cmd_gateway_call(config: &Config, tool: &str, args: Option<&str>) -> Result<()> {
    let Some(gateway) = &config.gateway else {
        anyhow::bail!(
            "No gateway configured. Add a \"gateway\" section to the config or set SWITCHBOARD_GATEWAY_URL."
        );
    };

    let arguments: Value = match args {
        Some(raw) => serde_json::from_str(raw).with_context(|| "--args must be a JSON object")?,
        None => Value::Object(Default::default()),
    };
    if !arguments.is_object() {
        anyhow::bail!("--args must be a JSON object");
    }

    let client = GatewayClient::from_config(gateway, Arc::new(TokenCache::new()))?;
    let result = client.call_tool(tool, arguments).await?;
    match result {
        Value::String(s) => println!("{}", s),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}
